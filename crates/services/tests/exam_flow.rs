use std::sync::{Arc, Mutex};

use exam_core::model::{
    ExamVariant, Question, QuestionId, QuestionKind, SectionKind, SessionPhase, VariantId,
};
use exam_core::time::fixed_clock;
use services::{
    ExamSession, PresentationError, PresentationModeController, QuestionBank, SessionConfig,
    Transition,
};

fn bank(counts: [u64; 4]) -> QuestionBank {
    let mut bank = QuestionBank::new();
    for (n, kind) in SectionKind::ALL.into_iter().enumerate() {
        for i in 0..counts[n] {
            let id = QuestionId::new(1000 * (n as u64 + 1) + i);
            bank.push(
                kind,
                Question::open(id, QuestionKind::Essay, format!("{kind} prompt {i}")).unwrap(),
            );
        }
    }
    bank
}

fn ielts(counts: [u64; 4], secs: u32) -> SessionConfig {
    SessionConfig::new(ExamVariant::builtin(VariantId::IeltsAcademic), bank(counts))
        .with_clock(fixed_clock())
        .with_uniform_duration_secs(secs)
}

#[test]
fn academic_ielts_end_to_end_by_navigation() {
    let mut session = ExamSession::start(ielts([2, 1, 1, 1], 2)).unwrap();
    session.begin().unwrap();

    let mut progress = vec![session.progress_percent()];
    let mut indices = vec![session.current_section_index().unwrap()];

    assert_eq!(session.next_question().unwrap(), Transition::NextQuestion(1));
    assert_eq!(
        session.next_question().unwrap(),
        Transition::NextSection(SectionKind::Reading)
    );
    progress.push(session.progress_percent());
    indices.push(session.current_section_index().unwrap());

    assert_eq!(
        session.next_question().unwrap(),
        Transition::NextSection(SectionKind::Writing)
    );
    progress.push(session.progress_percent());
    indices.push(session.current_section_index().unwrap());

    assert_eq!(
        session.next_question().unwrap(),
        Transition::NextSection(SectionKind::Speaking)
    );
    progress.push(session.progress_percent());
    indices.push(session.current_section_index().unwrap());

    let last = session.next_question().unwrap();
    assert!(matches!(last, Transition::Completed(_)));
    progress.push(session.progress_percent());

    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(progress, vec![25, 50, 75, 90, 100]);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(indices, vec![0, 1, 2, 3]);

    assert_eq!(session.scores().len(), 4);
    for kind in SectionKind::ALL {
        let score = session.scores().get(kind).unwrap().value();
        assert!((5.0..=9.0).contains(&score), "{kind}: {score}");
        assert_eq!((score * 2.0).fract(), 0.0);
    }
}

#[test]
fn completion_callback_fires_once_with_every_key() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let mut session = ExamSession::start(
        ielts([1, 1, 1, 1], 2).on_complete(move |scores| sink.lock().unwrap().push(scores)),
    )
    .unwrap();
    session.begin().unwrap();

    session.next_question().unwrap();
    session.next_question().unwrap();
    session.next_question().unwrap();
    // Let speaking run out instead of finishing it by hand.
    assert_eq!(session.tick(), None);
    assert!(matches!(session.tick(), Some(Transition::Completed(_))));

    // Nothing after completion can fire it again.
    for _ in 0..5 {
        assert_eq!(session.tick(), None);
    }
    assert!(session.advance_section().is_err());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let scores = calls[0];
    for kind in SectionKind::ALL {
        assert!((5.0..=9.0).contains(&scores.get(kind)));
    }
}

#[test]
fn timeout_matches_manual_completion() {
    let single_reading = |secs| {
        SessionConfig::new(ExamVariant::builtin(VariantId::SatMath), bank([0, 1, 0, 0]))
            .with_clock(fixed_clock())
            .with_uniform_duration_secs(secs)
    };

    let mut by_clock = ExamSession::start(single_reading(1)).unwrap();
    by_clock.begin().unwrap();
    let via_tick = by_clock.tick();

    let mut by_hand = ExamSession::start(single_reading(1)).unwrap();
    by_hand.begin().unwrap();
    let via_next = by_hand.next_question().unwrap();

    assert!(matches!(via_tick, Some(Transition::Completed(_))));
    assert!(matches!(via_next, Transition::Completed(_)));
    for session in [&by_clock, &by_hand] {
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert_eq!(session.progress_percent(), 100);
        assert!(session.scores().is_recorded(SectionKind::Reading));
        assert_eq!(session.scores().len(), 1);
    }
}

#[test]
fn timeout_on_middle_section_advances() {
    let mut session = ExamSession::start(ielts([1, 1, 1, 1], 30)).unwrap();
    session.begin().unwrap();
    session.next_question().unwrap();
    assert_eq!(session.current_section().unwrap().kind(), SectionKind::Reading);

    let mut remaining = session.remaining_secs();
    let mut transition = None;
    while transition.is_none() {
        transition = session.tick();
        assert!(session.remaining_secs() <= remaining || transition.is_some());
        remaining = session.remaining_secs();
    }
    assert_eq!(transition, Some(Transition::NextSection(SectionKind::Writing)));
    assert_eq!(session.current_question_index(), 0);
    assert_eq!(session.remaining_secs(), 30);
}

#[test]
fn sections_without_questions_refuse_to_start() {
    let err = ExamSession::start(ielts([1, 1, 0, 1], 2)).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.to_string(), "writing section of ielts-academic has no questions");
}

#[test]
fn sat_english_only_uses_writing_slot() {
    let cfg = SessionConfig::new(ExamVariant::builtin(VariantId::SatEnglish), bank([0, 0, 1, 0]))
        .with_clock(fixed_clock());
    let mut session = ExamSession::start(cfg).unwrap();
    session.begin().unwrap();
    let section = session.current_section().unwrap();
    assert_eq!(section.kind(), SectionKind::Writing);
    assert_eq!(section.display_title(), "SAT English");
    assert_eq!(session.progress_percent(), 75);

    let Transition::Completed(scores) = session.next_question().unwrap() else {
        panic!("single-section exam should complete");
    };
    assert_eq!(scores.listening, 0.0);
    assert_eq!(scores.reading, 0.0);
    assert_eq!(scores.speaking, 0.0);
    assert!(scores.writing >= 5.0);
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<&'static str>>>,
    refuse: bool,
}

impl PresentationModeController for Recorder {
    fn enter(&mut self) -> Result<(), PresentationError> {
        self.calls.lock().unwrap().push("enter");
        if self.refuse {
            return Err(PresentationError::Denied("no user gesture".into()));
        }
        Ok(())
    }

    fn exit(&mut self) -> Result<(), PresentationError> {
        self.calls.lock().unwrap().push("exit");
        Ok(())
    }
}

#[test]
fn presentation_mode_wraps_the_attempt() {
    let recorder = Recorder::default();
    let mut session =
        ExamSession::start(ielts([1, 1, 1, 1], 2).with_presentation(recorder.clone())).unwrap();
    assert!(recorder.calls.lock().unwrap().is_empty());

    session.begin().unwrap();
    while !session.is_complete() {
        session.next_question().unwrap();
    }
    drop(session);
    assert_eq!(*recorder.calls.lock().unwrap(), vec!["enter", "exit"]);
}

#[test]
fn refused_presentation_does_not_block_the_exam() {
    let recorder = Recorder {
        refuse: true,
        ..Recorder::default()
    };
    let mut session =
        ExamSession::start(ielts([1, 1, 1, 1], 2).with_presentation(recorder.clone())).unwrap();
    session.begin().unwrap();
    assert_eq!(session.phase(), SessionPhase::InProgress);
    assert!(!session.is_presenting());

    while !session.is_complete() {
        session.next_question().unwrap();
    }
    // Never entered, so never exited.
    assert_eq!(*recorder.calls.lock().unwrap(), vec!["enter"]);
}

#[test]
fn dropping_a_running_session_leaves_presentation_mode() {
    let recorder = Recorder::default();
    let mut session =
        ExamSession::start(ielts([1, 1, 1, 1], 2).with_presentation(recorder.clone())).unwrap();
    session.begin().unwrap();
    drop(session);
    assert_eq!(*recorder.calls.lock().unwrap(), vec!["enter", "exit"]);
}
