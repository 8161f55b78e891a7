//! Repository behaviour against a real Postgres; needs `DATABASE_URL`.

use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use duodriven::application::pagination::PageRequest;
use duodriven::application::repos::{
    CreateContactParams, CreatePostParams, CreateSubscriberParams, ContactsRepo, PostQueryFilter,
    PostsRepo, PostsWriteRepo, PublishedFilter, RepoError, SubscribersRepo,
};
use duodriven::domain::types::{PostSource, PostStatus, SubscriberStatus};
use duodriven::infra::db::PostgresRepositories;

fn params(slug: &str, status: PostStatus) -> CreatePostParams {
    CreatePostParams {
        title: slug.replace('-', " "),
        slug: slug.to_string(),
        excerpt: "Excerpt".to_string(),
        content: "Body".to_string(),
        featured_image: None,
        meta_title: None,
        meta_description: None,
        category: "digital-marketing".to_string(),
        tags: vec!["seo".to_string()],
        status,
        published_at: None,
        scheduled_for: None,
        author: "DUODRIVEN Team".to_string(),
        read_time: 1,
        source: PostSource::Api,
        external_id: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn duplicate_slug_maps_to_constraint_error(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);

    repos
        .create_post(params("growth-loops", PostStatus::Draft))
        .await
        .expect("first insert");
    let err = repos
        .create_post(params("growth-loops", PostStatus::Draft))
        .await
        .expect_err("duplicate slug");

    assert!(matches!(
        err,
        RepoError::Duplicate { ref constraint } if constraint == "posts_slug_key"
    ));
    assert!(repos.slug_exists("growth-loops", None).await.expect("exists"));
    assert_eq!(
        repos
            .count_slugs_with_prefix("growth-loops")
            .await
            .expect("count"),
        1
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn publish_due_only_touches_due_posts(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("whole seconds");

    let due = repos
        .create_post(CreatePostParams {
            scheduled_for: Some(now - Duration::minutes(1)),
            ..params("due-post", PostStatus::Scheduled)
        })
        .await
        .expect("due");
    let later = repos
        .create_post(CreatePostParams {
            scheduled_for: Some(now + Duration::hours(1)),
            ..params("later-post", PostStatus::Scheduled)
        })
        .await
        .expect("later");

    assert_eq!(repos.publish_due(now).await.expect("sweep"), vec![due.id]);
    assert!(repos.publish_due(now).await.expect("sweep").is_empty());

    let published = repos
        .find_by_id(due.id)
        .await
        .expect("lookup")
        .expect("due post");
    assert_eq!(published.status, PostStatus::Published);
    assert_eq!(published.published_at, Some(now));
    assert!(published.scheduled_for.is_none());

    let pending = repos
        .find_by_id(later.id)
        .await
        .expect("lookup")
        .expect("later post");
    assert_eq!(pending.status, PostStatus::Scheduled);

    let listing = repos
        .list_published(&PublishedFilter::default(), PageRequest::new(10, 0))
        .await
        .expect("published listing");
    assert_eq!(listing.total, 1);

    let drafts = repos
        .list_posts(
            &PostQueryFilter {
                status: Some(PostStatus::Scheduled),
                category: None,
            },
            PageRequest::new(10, 0),
        )
        .await
        .expect("scheduled listing");
    assert_eq!(drafts.items.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn view_counter_increments_atomically(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let post = repos
        .create_post(CreatePostParams {
            published_at: Some(OffsetDateTime::now_utc()),
            ..params("popular", PostStatus::Published)
        })
        .await
        .expect("post");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repos = repos.clone();
        handles.push(tokio::spawn(async move {
            repos.increment_views(post.id).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("increment");
    }

    let stored = repos
        .find_by_id(post.id)
        .await
        .expect("lookup")
        .expect("post");
    assert_eq!(stored.views, 8);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn subscribers_and_contacts_persist(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);

    let subscriber = repos
        .create_subscriber(CreateSubscriberParams {
            email: "ada@example.com".to_string(),
            name: None,
            source: "website".to_string(),
        })
        .await
        .expect("subscriber");
    assert_eq!(subscriber.status, SubscriberStatus::Active);

    let err = repos
        .create_subscriber(CreateSubscriberParams {
            email: "ada@example.com".to_string(),
            name: None,
            source: "website".to_string(),
        })
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, RepoError::Duplicate { .. }));
    assert_eq!(
        repos
            .count_by_status(SubscriberStatus::Active)
            .await
            .expect("count"),
        1
    );

    repos
        .create_submission(CreateContactParams {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            message: "Hello".to_string(),
            ..CreateContactParams::default()
        })
        .await
        .expect("contact");
    let counts = repos.contact_counts().await.expect("counts");
    assert_eq!(counts.total, 1);
    assert_eq!(counts.new, 1);
}
