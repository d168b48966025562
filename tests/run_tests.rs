
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use relaxq::config::MarkerFiles;
use relaxq::db::job::load::{get_row, get_state};
use relaxq::db::job::state::JobState;
use relaxq::db::job::update::{converge, transition};
use relaxq::db::StoreError;
use relaxq::workflow::marker::write_marker;
use relaxq::workflow::run::{relax, run};
use relaxq::WorkingDirectory;
use test_harness::{co_on_pt, command_spec, FakeCalculator, Harness};

#[test]
fn marks_running_before_calculating_and_converged_after() {
    let h = Harness::new();
    let id = h.add(None);
    transition(&h.conn, id, JobState::Queued).unwrap();

    let seen = Rc::new(RefCell::new(None));
    let mut calc = FakeCalculator::converging(-17.25);
    let probe_seen = seen.clone();
    let probe_conn = h.reopen();
    calc.probe = Some(Box::new(move || {
        *probe_seen.borrow_mut() = Some(get_state(&probe_conn, id).unwrap());
    }));

    let energy = relax(&h.conn, get_row(&h.conn, id).unwrap(), &mut calc).unwrap();

    assert_eq!(energy, -17.25);
    assert_eq!(*seen.borrow(), Some(JobState::Running));
    let row = get_row(&h.conn, id).unwrap();
    assert_eq!(row.state, JobState::Converged);
    assert_eq!(row.energy, Some(-17.25));
    assert_eq!(row.structure.positions[2][2], co_on_pt().positions[2][2] - 0.1);
    assert!(row.state.flags().converged);
}

#[test]
fn failing_calculator_leaves_row_failed() {
    let h = Harness::new();
    let id = h.add(None);
    transition(&h.conn, id, JobState::Queued).unwrap();
    let mut calc = FakeCalculator::failing("SCF did not converge");

    let err = relax(&h.conn, get_row(&h.conn, id).unwrap(), &mut calc).unwrap_err();

    assert!(format!("{err:#}").contains("SCF did not converge"));
    let row = get_row(&h.conn, id).unwrap();
    assert_eq!(row.state, JobState::Failed);
    assert!(row.state.flags().started);
    assert!(!row.state.flags().converged);
    assert_eq!(row.structure, co_on_pt());
    assert_eq!(row.energy, None);
}

#[test]
fn converged_row_is_not_calculated_again() {
    let h = Harness::new();
    let id = h.add(None);
    transition(&h.conn, id, JobState::Running).unwrap();
    converge(&h.conn, id, &co_on_pt(), -5.0).unwrap();
    let mut calc = FakeCalculator::converging(-1.0);

    let err = relax(&h.conn, get_row(&h.conn, id).unwrap(), &mut calc).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::IllegalTransition { from: JobState::Converged, to: JobState::Running, .. })
    ));
    assert_eq!(calc.calls, 0);
    assert_eq!(get_row(&h.conn, id).unwrap().energy, Some(-5.0));
}

#[test]
fn runs_row_that_was_never_queued() {
    let h = Harness::new();
    let id = h.add(None);
    let mut calc = FakeCalculator::converging(-2.5);

    relax(&h.conn, get_row(&h.conn, id).unwrap(), &mut calc).unwrap();

    assert_eq!(calc.calls, 1);
    assert_eq!(get_state(&h.conn, id).unwrap(), JobState::Converged);
}

#[cfg(unix)]
#[test]
fn prepared_directory_runs_with_default_markers() {
    use relaxq::calculator::CalculatorSpec;
    use relaxq::workflow::provision::{provision, ProvisionOptions};

    let h = Harness::new();
    let script = r#"printf '{"energy": -8.0}' > calc_output.json"#;
    let spec = CalculatorSpec::Command { program: "/bin/sh".into(), args: vec!["-c".into(), script.into()] };
    let id = h.add(Some(spec));
    let base = WorkingDirectory::new(h.base());

    let report = provision(&h.conn, &ProvisionOptions::new(base.clone())).unwrap();
    assert_eq!(report.created, vec![id]);

    let energy = run(&h.conn, &base.job(id), &MarkerFiles::default()).unwrap();

    assert_eq!(energy, -8.0);
    let row = get_row(&h.conn, id).unwrap();
    assert_eq!(row.state, JobState::Converged);
    assert_eq!(row.energy, Some(-8.0));
}

#[test]
fn row_without_calculator_is_left_queued() {
    let h = Harness::new();
    let id = h.add(None);
    transition(&h.conn, id, JobState::Queued).unwrap();
    let job = WorkingDirectory::new(h.base());
    write_marker(&job.path, "db_id", id).unwrap();

    let err = run(&h.conn, &job, &MarkerFiles::default()).unwrap_err();

    assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NoCalculator(_))));
    assert_eq!(get_state(&h.conn, id).unwrap(), JobState::Queued);
}

#[test]
fn missing_marker_fails_before_any_write() {
    let h = Harness::new();
    let id = h.add(Some(command_spec()));
    transition(&h.conn, id, JobState::Queued).unwrap();

    assert!(run(&h.conn, &WorkingDirectory::new(h.base()), &MarkerFiles::default()).is_err());
    assert_eq!(get_state(&h.conn, id).unwrap(), JobState::Queued);
}

#[test]
fn marker_naming_missing_row_is_an_error() {
    let h = Harness::new();
    let job = WorkingDirectory::new(h.base());
    write_marker(&job.path, "db_id", 404).unwrap();

    let err = run(&h.conn, &job, &MarkerFiles::default()).unwrap_err();

    assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotFound(404))));
}

#[cfg(unix)]
#[test]
fn runs_attached_command_in_job_directory() {
    use relaxq::calculator::CalculatorSpec;

    let h = Harness::new();
    let script = r#"printf '{"energy": -42.0}' > calc_output.json"#;
    let spec = CalculatorSpec::Command { program: "/bin/sh".into(), args: vec!["-c".into(), script.into()] };
    let id = h.add(Some(spec));
    transition(&h.conn, id, JobState::Queued).unwrap();
    let job = WorkingDirectory::new(h.base()).job(id);
    fs::create_dir(&job.path).unwrap();
    write_marker(&job.path, "db_id", id).unwrap();

    let energy = run(&h.conn, &job, &MarkerFiles::default()).unwrap();

    assert_eq!(energy, -42.0);
    assert!(job.path.join("calc_input.json").exists());
    assert_eq!(get_state(&h.conn, id).unwrap(), JobState::Converged);
}

#[cfg(unix)]
#[test]
fn crashing_command_marks_row_failed() {
    use relaxq::calculator::CalculatorSpec;

    let h = Harness::new();
    let spec = CalculatorSpec::Command { program: "/bin/sh".into(), args: vec!["-c".into(), "exit 1".into()] };
    let id = h.add(Some(spec));
    transition(&h.conn, id, JobState::Queued).unwrap();
    let job = WorkingDirectory::new(h.base());
    write_marker(&job.path, "db_id", id).unwrap();

    assert!(run(&h.conn, &job, &MarkerFiles::default()).is_err());
    assert_eq!(get_state(&h.conn, id).unwrap(), JobState::Failed);
}
