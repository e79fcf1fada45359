//! End-to-end check-in sessions through the public API

use pretty_assertions::assert_eq;
use silentrisk::flow::Action;
use silentrisk::report::{ReportBuilder, NO_FACTORS_MESSAGE};
use silentrisk::types::Accuracy;
use silentrisk::{
    FileStorage, FlowController, Influence, MemoryStorage, RiskLevel, Screen, StateStorage,
};

fn walk_to_context<S: StateStorage>(flow: &mut FlowController<S>, answers: [i32; 5]) {
    flow.get_started().unwrap();
    flow.accept_consent().unwrap();
    for value in answers {
        flow.answer(value).unwrap();
        flow.next_question().unwrap();
    }
    assert_eq!(flow.screen(), Screen::Context);
}

#[test]
fn neutral_checkin_reports_no_factors() {
    let mut flow =
        FlowController::open(MemoryStorage::new()).with_report_builder(ReportBuilder::with_seed(3));
    walk_to_context(&mut flow, [50, 50, 50, 50, 50]);
    flow.analyze().unwrap();

    let report = flow.results().unwrap();
    assert_eq!(report.assessment.level, RiskLevel::Medium);
    assert!(report.contributors.is_empty());
    assert_eq!(report.no_factors_message.as_deref(), Some(NO_FACTORS_MESSAGE));
    assert!((68..83).contains(&report.confidence_pct));
}

#[test]
fn context_tags_become_a_contributor() {
    let mut flow = FlowController::open(MemoryStorage::new());
    walk_to_context(&mut flow, [50, 50, 50, 50, 50]);
    flow.toggle_influence(Influence::Exams).unwrap();
    flow.toggle_influence(Influence::Travel).unwrap();
    flow.analyze().unwrap();

    let report = flow.results().unwrap();
    assert_eq!(report.contributors.len(), 1);
    assert_eq!(report.contributors[0].name, "Context factors");
    assert_eq!(report.contributors[0].value, 100);
}

#[test]
fn session_survives_restart_and_start_over_clears_it() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut flow = FlowController::open(FileStorage::new(dir.path()));
        walk_to_context(&mut flow, [90, 10, 90, 90, 90]);
        flow.analyze().unwrap();
        flow.record_feedback(Accuracy::Yes).unwrap();
        assert_eq!(flow.results().unwrap().assessment.level, RiskLevel::Low);
    }

    let mut flow = FlowController::open(FileStorage::new(dir.path()));
    assert_eq!(flow.screen(), Screen::Results);
    assert_eq!(flow.state().feedback_data.accuracy, Some(Accuracy::Yes));
    assert!(flow.results().unwrap().feedback.acknowledgement.is_some());

    flow.dispatch(Action::StartOver).unwrap();
    assert_eq!(flow.screen(), Screen::Splash);
    assert!(!flow.state().has_consented);

    let reopened = FlowController::open(FileStorage::new(dir.path()));
    assert_eq!(reopened.screen(), Screen::Splash);
}

#[test]
fn corrupt_record_restarts_at_splash() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path());
    storage
        .write(silentrisk::storage::DEFAULT_STORAGE_KEY, "{not json")
        .unwrap();

    let flow = FlowController::open(storage);
    assert_eq!(flow.screen(), Screen::Splash);
    assert!(!flow.state().has_consented);
}
