mod common;

use common::{run, settings, RecordingExecutor, ScriptedConfirm};
use stagehand::deploy::{self, DeployOptions, CLONE_QUESTION};
use stagehand::session::StepKind;
use stagehand::ErrorCode;

const CHECK_REMOTE: &str = "remote: test -d /srv/www/shop";
const CHECK_STATIC: &str = "remote[/srv/www/shop]: test -d /srv/www/shop/static";

fn clone_steps() -> Vec<&'static str> {
    vec![
        "remote: mkdir /srv/www/shop",
        "remote[/srv/www/shop]: git clone --recursive git@example.org:acme/shop.git .",
        "remote[/srv/www/shop]: mkdir db",
        "remote[/srv/www/shop]: chmod 777 db",
        "put: deploy/production_settings.py -> /srv/www/shop/app/shop/local_settings.py",
        "remote[/srv/www/shop/app]: ./manage.py syncdb",
        "remote[/srv/www/shop]: chmod -R 777 db",
    ]
}

fn update_steps() -> Vec<&'static str> {
    vec![
        "remote[/srv/www/shop]: git pull",
        "remote[/srv/www/shop]: git submodule update",
        "remote[/srv/www/shop]: mkdir static_tmp",
        "sync: static/ -> /srv/www/shop/static_tmp/",
        CHECK_STATIC,
        "remote[/srv/www/shop]: mv static static_old",
        "remote[/srv/www/shop]: mv static_tmp static",
        "remote[/srv/www/shop]: rm -rf static_old",
        "remote[/srv/www/shop]: chmod -R 777 db",
        "put: deploy/production_settings.py -> /srv/www/shop/app/shop/local_settings.py",
        "remote: sudo service httpd reload",
    ]
}

#[test]
fn deploy_updates_existing_deployment() {
    let settings = settings();
    let mut exec = RecordingExecutor::new();
    let mut confirm = ScriptedConfirm::none();

    let (result, history) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::deploy(s, DeployOptions::default())
    });

    result.unwrap();
    let mut expected = vec![CHECK_REMOTE];
    expected.extend(update_steps());
    assert_eq!(exec.calls, expected);
    assert!(confirm.asked.is_empty());
    assert!(history.iter().all(|step| step.success));
}

#[test]
fn deploy_offers_clone_when_remote_dir_is_missing() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail(CHECK_REMOTE);
    let mut confirm = ScriptedConfirm::answering(&[true]);

    let (result, history) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::deploy(s, DeployOptions::default())
    });

    result.unwrap();
    assert_eq!(confirm.asked, vec![CLONE_QUESTION]);

    let mut expected = vec![CHECK_REMOTE];
    expected.extend(clone_steps());
    expected.extend(update_steps());
    assert_eq!(exec.calls, expected);

    // The failed probe is recorded, but as a tolerated failure.
    assert_eq!(history[0].kind, StepKind::Remote);
    assert!(!history[0].success);
    assert!(history[0].tolerant);
    assert_eq!(history[1].kind, StepKind::Confirm);
}

#[test]
fn declining_clone_stops_before_any_change() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail(CHECK_REMOTE);
    let mut confirm = ScriptedConfirm::answering(&[false]);

    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::deploy(s, DeployOptions::default())
    });

    let err = result.unwrap_err();
    assert_eq!(err.code, ErrorCode::UserAborted);
    assert_eq!(err.details["question"], CLONE_QUESTION);
    assert_eq!(exec.calls, vec![CHECK_REMOTE]);
}

#[test]
fn skip_remote_check_goes_straight_to_update() {
    let settings = settings();
    let mut exec = RecordingExecutor::new();
    let mut confirm = ScriptedConfirm::none();

    let options = DeployOptions {
        skip_remote_check: true,
        fresh_clone: false,
    };
    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| deploy::deploy(s, options));

    result.unwrap();
    assert_eq!(exec.calls, update_steps());
    assert!(!exec.calls.iter().any(|c| c == CHECK_REMOTE));
}

#[test]
fn skipped_check_still_clones_a_missing_deployment() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().missing_dir("remote[/srv/www/shop]: git pull");
    let mut confirm = ScriptedConfirm::none();

    let options = DeployOptions {
        skip_remote_check: true,
        fresh_clone: false,
    };
    let (result, history) = run(&settings, &mut exec, &mut confirm, |s| deploy::deploy(s, options));

    result.unwrap();
    let mut expected = vec!["remote[/srv/www/shop]: git pull"];
    expected.extend(clone_steps());
    expected.extend(update_steps());
    assert_eq!(exec.calls, expected);
    assert!(!exec.calls.iter().any(|c| c == CHECK_REMOTE));
    assert!(confirm.asked.is_empty());
    assert!(history[0].tolerant);
    assert!(!history[0].success);
}

#[test]
fn failed_pull_in_existing_deployment_is_not_a_clone_signal() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail("remote[/srv/www/shop]: git pull");
    let mut confirm = ScriptedConfirm::none();

    let options = DeployOptions {
        skip_remote_check: true,
        fresh_clone: false,
    };
    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| deploy::deploy(s, options));

    assert_eq!(result.unwrap_err().code, ErrorCode::RemoteCommandFailed);
    assert_eq!(exec.calls, vec!["remote[/srv/www/shop]: git pull"]);
}

#[test]
fn first_deploy_has_no_static_backup() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail(CHECK_STATIC);
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::deploy(s, DeployOptions::default())
    });

    result.unwrap();
    assert!(exec
        .calls
        .contains(&"remote[/srv/www/shop]: mv static_tmp static".to_string()));
    assert!(!exec.calls.iter().any(|c| c.contains("static_old")));
}

#[test]
fn failed_step_aborts_the_rest() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail("remote[/srv/www/shop]: git pull");
    let mut confirm = ScriptedConfirm::none();

    let (result, history) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::deploy(s, DeployOptions::default())
    });

    let err = result.unwrap_err();
    assert_eq!(err.code, ErrorCode::RemoteCommandFailed);
    assert_eq!(err.details["command"], "git pull");
    assert_eq!(err.details["dir"], "/srv/www/shop");
    assert_eq!(err.details["host"], "deploy@web1.example.org");
    assert_eq!(
        exec.calls,
        vec![CHECK_REMOTE, "remote[/srv/www/shop]: git pull"]
    );
    assert_eq!(history.len(), 2);
}

#[test]
fn failed_sync_is_a_transfer_error() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail("sync: static/ -> /srv/www/shop/static_tmp/");
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::deploy(s, DeployOptions::default())
    });

    let err = result.unwrap_err();
    assert_eq!(err.code, ErrorCode::TransferFailed);
    assert_eq!(err.details["destination"], "/srv/www/shop/static_tmp/");
    assert_eq!(
        exec.calls.last().map(String::as_str),
        Some("sync: static/ -> /srv/www/shop/static_tmp/")
    );
}

#[test]
fn custom_reload_command_runs_last() {
    let mut settings = settings();
    settings.reload_command = vec!["touch".to_string(), "app/wsgi.py".to_string()];
    let mut exec = RecordingExecutor::new();
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::deploy(s, DeployOptions::default())
    });

    result.unwrap();
    assert_eq!(
        exec.calls.last().map(String::as_str),
        Some("remote: touch app/wsgi.py")
    );
}

#[test]
fn clone_builds_deployment_in_order() {
    let settings = settings();
    let mut exec = RecordingExecutor::new();
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, deploy::clone);

    result.unwrap();
    assert_eq!(exec.calls, clone_steps());
}

#[test]
fn clone_stops_when_directory_cannot_be_created() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail("remote: mkdir /srv/www/shop");
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, deploy::clone);

    assert_eq!(result.unwrap_err().code, ErrorCode::RemoteCommandFailed);
    assert_eq!(exec.calls, vec!["remote: mkdir /srv/www/shop"]);
}

#[test]
fn reclone_moves_deployment_aside_then_clones_without_probing() {
    let settings = settings();
    let mut exec = RecordingExecutor::new();
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, deploy::reclone);

    let backup = result.unwrap();
    assert!(!backup.is_empty());
    assert!(!backup.contains([':', ' ', '/']));

    let mut expected = vec![format!("remote[/srv/www]: mv shop {}", backup)];
    expected.extend(clone_steps().into_iter().map(String::from));
    expected.extend(update_steps().into_iter().map(String::from));
    assert_eq!(exec.calls, expected);
    assert!(confirm.asked.is_empty());
}

#[test]
fn push_localsettings_targets_app_package() {
    let settings = settings();
    let mut exec = RecordingExecutor::new();
    let mut confirm = ScriptedConfirm::none();

    let (result, history) = run(&settings, &mut exec, &mut confirm, deploy::push_localsettings);

    result.unwrap();
    assert_eq!(
        exec.calls,
        vec!["put: deploy/production_settings.py -> /srv/www/shop/app/shop/local_settings.py"]
    );
    assert_eq!(history[0].kind, StepKind::Put);
}

#[test]
fn prepare_deploy_commits_pushes_then_publishes() {
    let settings = settings();
    let mut exec = RecordingExecutor::new();
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::prepare_deploy(s, Some("release 1.2"))
    });

    result.unwrap();
    assert_eq!(exec.calls[0], "local: git add -p");
    assert_eq!(exec.calls[1], "local: git commit -m 'release 1.2'");
    assert_eq!(exec.calls[2], "local: git push");
    assert!(exec.calls[3].starts_with("local[assets/favicons]: convert favicon.svg"));
    assert_eq!(
        exec.calls.last().map(String::as_str),
        Some("local: s3put -a AKIA123 -s s3cr3t -b shop-assets -p /home/dev/shop -g public-read static")
    );
}

#[test]
fn prepare_deploy_does_not_publish_after_failed_push() {
    let settings = settings();
    let mut exec = RecordingExecutor::new().fail("local: git push");
    let mut confirm = ScriptedConfirm::none();

    let (result, _) = run(&settings, &mut exec, &mut confirm, |s| {
        deploy::prepare_deploy(s, None)
    });

    assert_eq!(result.unwrap_err().code, ErrorCode::LocalCommandFailed);
    assert_eq!(
        exec.calls,
        vec!["local: git add -p", "local: git commit", "local: git push"]
    );
}
