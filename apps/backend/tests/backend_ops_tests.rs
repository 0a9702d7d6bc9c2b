mod common;

use aiida_backends::repos::settings::{set_setting, DAEMON_USER_KEY};
use aiida_backends::{BackendKind, ErrorKind, LogTarget, WorkflowListFilter, WorkflowState};
use backend_test_support::unique_helpers::unique_email;
use common::{loaded_env, seed_computer, seed_log, seed_user, seed_workflow};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

#[tokio::test]
async fn test_automatic_user_is_profile_default() {
    for kind in BackendKind::ALL {
        let t = loaded_env(kind).await;
        seed_user(&t.conn, &unique_email("other")).await;

        let user = t.env.automatic_user().await.unwrap();
        assert_eq!(user, t.default_user, "{kind}");
    }
}

#[tokio::test]
async fn test_automatic_user_missing_row() {
    for kind in BackendKind::ALL {
        let t = loaded_env(kind).await;
        sea_orm::ConnectionTrait::execute_unprepared(&t.conn, "DELETE FROM db_dbuser")
            .await
            .unwrap();

        let err = t.env.automatic_user().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration, "{kind}");
        assert!(err.to_string().contains(&t.default_user.email));
    }
}

#[tokio::test]
async fn test_log_messages_are_filtered_and_ordered() {
    let t1 = datetime!(2019-03-12 10:00 UTC);
    let t2 = datetime!(2019-03-12 11:00 UTC);

    for kind in BackendKind::ALL {
        let t = loaded_env(kind).await;
        seed_log(&t.conn, "node", 7, t2, "second").await;
        seed_log(&t.conn, "node", 7, t1, "first").await;
        seed_log(&t.conn, "node", 7, t1, "first, logged later").await;
        seed_log(&t.conn, "node", 8, t1, "other object").await;
        seed_log(&t.conn, "workflow", 7, t1, "other kind").await;

        let logs = t
            .env
            .log_messages(&LogTarget::new("node", 7))
            .await
            .unwrap();
        let messages: Vec<_> = logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(
            messages,
            ["first", "first, logged later", "second"],
            "{kind}"
        );
        assert!(logs.iter().all(|l| l.objpk == Some(7)));
        assert_eq!(logs[0].time, t1);
    }
}

#[tokio::test]
async fn test_log_messages_empty() {
    for kind in BackendKind::ALL {
        let t = loaded_env(kind).await;
        let logs = t
            .env
            .log_messages(&LogTarget::new("node", 1))
            .await
            .unwrap();
        assert!(logs.is_empty(), "{kind}");
    }
}

#[tokio::test]
async fn test_daemon_user_falls_back_to_default_email() {
    for kind in BackendKind::ALL {
        let t = loaded_env(kind).await;
        assert_eq!(
            t.env.daemon_user().await.unwrap(),
            t.default_user.email,
            "{kind}"
        );

        set_setting(&t.conn, DAEMON_USER_KEY, "daemon@example.test", "daemon user")
            .await
            .unwrap();
        assert_eq!(
            t.env.daemon_user().await.unwrap(),
            "daemon@example.test",
            "{kind}"
        );
    }
}

#[tokio::test]
async fn test_workflow_list_unsupported_on_sqlalchemy() {
    let t = loaded_env(BackendKind::SqlAlchemy).await;
    let err = t
        .env
        .workflow_list(&WorkflowListFilter::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert!(err.to_string().contains("sqlalchemy"));
}

#[tokio::test]
async fn test_workflow_list_filters_on_django() {
    let t = loaded_env(BackendKind::Django).await;
    let now = OffsetDateTime::now_utc();
    let owner = t.default_user.clone();
    let other = seed_user(&t.conn, &unique_email("other")).await;

    let recent = seed_workflow(&t.conn, &owner, WorkflowState::Running, now - Duration::days(1)).await;
    let done = seed_workflow(&t.conn, &owner, WorkflowState::Finished, now - Duration::days(2)).await;
    let old = seed_workflow(&t.conn, &owner, WorkflowState::Running, now - Duration::days(10)).await;
    let foreign = seed_workflow(&t.conn, &other, WorkflowState::Created, now).await;

    let ids = |list: Vec<aiida_backends::Workflow>| list.into_iter().map(|w| w.id).collect::<Vec<_>>();

    let active = t
        .env
        .workflow_list(&WorkflowListFilter::for_user(owner.id))
        .await
        .unwrap();
    assert_eq!(ids(active), [old.id, recent.id]);

    let all = t
        .env
        .workflow_list(&WorkflowListFilter::for_user(owner.id).all_states(true))
        .await
        .unwrap();
    assert_eq!(ids(all), [old.id, done.id, recent.id]);

    let fresh = t
        .env
        .workflow_list(&WorkflowListFilter::for_user(owner.id).n_days_ago(5))
        .await
        .unwrap();
    assert_eq!(ids(fresh), [recent.id]);

    // explicit pks ignore state and owner
    let picked = t
        .env
        .workflow_list(&WorkflowListFilter::by_pks([foreign.id, done.id]))
        .await
        .unwrap();
    assert_eq!(ids(picked), [done.id, foreign.id]);

    let everyone = t
        .env
        .workflow_list(&WorkflowListFilter::default())
        .await
        .unwrap();
    assert_eq!(ids(everyone), [old.id, recent.id, foreign.id]);
}

#[tokio::test]
async fn test_lookup_helpers() {
    let t = loaded_env(BackendKind::Django).await;
    let computer = seed_computer(&t.conn, "localhost").await;
    let loaded = t.env.loaded().unwrap();

    assert_eq!(loaded.find_computer("localhost").await.unwrap(), computer);
    assert_eq!(
        loaded.find_user(&t.default_user.email).await.unwrap(),
        t.default_user
    );
    assert_eq!(
        loaded.find_computer("nowhere").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        loaded.find_user("ghost@example.test").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_workflow_list_with_huge_window_lists_everything() {
    let t = loaded_env(BackendKind::Django).await;
    let now = OffsetDateTime::now_utc();
    let old = seed_workflow(&t.conn, &t.default_user, WorkflowState::Running, now - Duration::days(400)).await;
    let recent = seed_workflow(&t.conn, &t.default_user, WorkflowState::Sleep, now).await;

    let listed = t
        .env
        .workflow_list(&WorkflowListFilter::for_user(t.default_user.id).n_days_ago(u32::MAX))
        .await
        .unwrap();
    let ids: Vec<_> = listed.into_iter().map(|w| w.id).collect();
    assert_eq!(ids, [old.id, recent.id]);
}
