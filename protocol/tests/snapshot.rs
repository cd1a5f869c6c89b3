use std::rc::Rc;

use quizgrid_core::{
    Board, GameSize, Pattern, PlayerId, Question, QuestionKind, RaceAttempt, ValueMode, scores,
};
use quizgrid_protocol::*;

fn question(id: &str) -> Question {
    Question {
        id: id.to_string(),
        level: 1,
        title: "1 + 1".to_string(),
        answers: vec!["2".to_string(), "3".to_string()],
        correct: 0,
    }
}

fn setup() -> (Rc<ManualClock>, Repository<Rc<MemoryStore>>, String) {
    let clock = Rc::new(ManualClock::new(0));
    let store = Rc::new(MemoryStore::new(clock.clone()));
    let repo = Repository::new(store, Collections::default());

    let players = vec![PlayerDoc::new("orange"), PlayerDoc::new("lightblue"), PlayerDoc::new("pink")];
    let board = Board::new(GameSize::new(3, 3));
    let game = GameDoc::new("g1".to_string(), players, &board, question("base"), Default::default());
    repo.put_game(&game).unwrap();
    (clock, repo, "g1".to_string())
}

fn ask(repo: &Repository<Rc<MemoryStore>>, game: &str, id: &str, kind: QuestionKind, mover: &str) {
    let doc = QuestionDoc {
        id: id.to_string(),
        posted_at: 0,
        delay_time: 3_000,
        player_move: PlayerMoveDoc::new(mover, (1, 1), Pattern::Normal),
        question: question(id),
        question_type: kind,
        is_closed: false,
    };
    repo.post_question(game, &doc).unwrap();
}

fn answer(repo: &Repository<Rc<MemoryStore>>, game: &str, question_id: &str, color: &str, choice: i32) {
    let doc = AnswerDoc {
        question_id: question_id.to_string(),
        player: color.to_string(),
        answer: choice,
        client_date: 0,
        think_time: 0,
    };
    repo.put_answer(game, &doc).unwrap();
}

fn load(repo: &Repository<Rc<MemoryStore>>) -> GameSnapshot {
    GameSnapshot::load_latest(repo).unwrap().unwrap()
}

#[test]
fn no_game_loads_as_none() {
    let clock = Rc::new(ManualClock::new(0));
    let repo = Repository::new(MemoryStore::new(clock), Collections::default());
    assert_eq!(GameSnapshot::load_latest(&repo).unwrap(), None);
}

#[test]
fn latest_game_wins() {
    let (clock, repo, _) = setup();
    clock.advance(5);
    let board = Board::new(GameSize::new(4, 4));
    let newer = GameDoc::new("g2".to_string(), vec![PlayerDoc::new("aqua")], &board, question("x"), Default::default());
    repo.put_game(&newer).unwrap();

    assert_eq!(load(&repo).id(), "g2");
}

#[test]
fn solo_question_is_current_until_mover_answers() {
    let (_, repo, game) = setup();
    ask(&repo, &game, "q1", QuestionKind::Balanced, "lightblue");
    assert_eq!(load(&repo).current_question().map(|q| q.id.as_str()), Some("q1"));

    answer(&repo, &game, "q1", "orange", 0);
    assert!(load(&repo).current_question().is_some());

    answer(&repo, &game, "q1", "lightblue", 1);
    assert!(load(&repo).current_question().is_none());
}

#[test]
fn answers_outlive_the_lookup_key() {
    let (_, repo, game) = setup();
    ask(&repo, &game, "q1", QuestionKind::Safe, "orange");
    answer(&repo, &game, "q1", "orange", 1);
    let snapshot = load(&repo);

    let found = {
        let id = format!("q{}", 1);
        snapshot.answer_of(&id, "orange")
    };
    assert_eq!(found.map(|a| a.data.answer), Some(1));
    assert!(snapshot.answer_of("q1", "pink").is_none());

    let attempts = {
        let id = "q1".to_string();
        snapshot.attempts_for(&id).count()
    };
    assert_eq!(attempts, 0);
}

#[test]
fn competitive_question_waits_for_everyone() {
    let (_, repo, game) = setup();
    ask(&repo, &game, "q1", QuestionKind::Race, "orange");
    answer(&repo, &game, "q1", "orange", 0);
    answer(&repo, &game, "q1", "pink", AnswerDoc::EMPTY);
    assert!(load(&repo).current_question().is_some());

    answer(&repo, &game, "q1", "lightblue", 1);
    assert!(load(&repo).current_question().is_none());
}

#[test]
fn move_on_the_cell_resolves_the_question() {
    let (_, repo, game) = setup();
    ask(&repo, &game, "q1", QuestionKind::Duel, "orange");
    let mv = MoveDoc {
        question_id: "q1".to_string(),
        question_type: QuestionKind::Duel,
        player_move: PlayerMoveDoc::new("pink", (1, 1), Pattern::Normal),
        value: 1.0,
    };
    repo.create_move(&game, &mv).unwrap();

    let err = repo.create_move(&game, &mv).unwrap_err();
    assert!(err.is_contention());

    let snapshot = load(&repo);
    assert!(snapshot.current_question().is_none());
    let board = snapshot.board_at(snapshot.moves.len(), ValueMode::Recorded).unwrap();
    assert_eq!(board[(1, 1)].owner, Some(PlayerId(2)));
    assert_eq!(scores(&board, 3)[2].score, 1.0);
}

#[test]
fn race_attempts_keep_server_order() {
    let (clock, repo, game) = setup();
    ask(&repo, &game, "q1", QuestionKind::Race, "orange");
    for (color, correct) in [("pink", true), ("orange", true), ("lightblue", false)] {
        clock.advance(100);
        let doc = MoveAttemptDoc {
            question_id: "q1".to_string(),
            player_move: PlayerMoveDoc::new(color, (1, 1), Pattern::Normal),
            is_correct: correct,
            move_attempt_date: 3_000,
            question_type: QuestionKind::Race,
        };
        repo.put_move_attempt(&game, &doc).unwrap();
    }

    let snapshot = load(&repo);
    assert_eq!(
        snapshot.race_attempts("q1"),
        [
            RaceAttempt { player: PlayerId(2), correct: true },
            RaceAttempt { player: PlayerId(0), correct: true },
            RaceAttempt { player: PlayerId(1), correct: false },
        ]
    );
    assert_eq!(snapshot.race_questions_for((1, 1)), 1);
    assert_eq!(snapshot.competitive_attempts_at((1, 1)).len(), 3);
    assert!(snapshot.competitive_attempts_at((0, 0)).is_empty());
}

#[test]
fn closing_a_question_succeeds_once() {
    let (_, repo, game) = setup();
    ask(&repo, &game, "q1", QuestionKind::Safe, "orange");
    let snapshot = load(&repo);
    let question = snapshot.last_question().unwrap();

    let closed = repo.close_question(&game, question).unwrap();
    assert!(closed.data.is_closed);
    assert!(repo.close_question(&game, question).unwrap_err().is_contention());
}

#[test]
fn watch_reports_only_changes() {
    let (_, repo, game) = setup();
    let mut watch = Watch::new();

    assert!(matches!(watch.poll(&repo).unwrap(), Some(WatchUpdate::Game(_))));
    assert_eq!(watch.poll(&repo).unwrap(), None);

    ask(&repo, &game, "q1", QuestionKind::Safe, "orange");
    let Some(WatchUpdate::Game(snapshot)) = watch.poll(&repo).unwrap() else {
        panic!("expected a new snapshot");
    };
    assert_eq!(snapshot.questions.len(), 1);
}

#[test]
fn watch_skips_unconfirmed_snapshots() {
    let (_, repo, _) = setup();
    let mut watch = Watch::new();
    repo.store().set_metadata(SnapshotMetadata {
        has_pending_writes: true,
        from_cache: false,
    });
    assert_eq!(watch.poll(&repo).unwrap(), None);

    repo.store().set_metadata(SnapshotMetadata::default());
    assert!(watch.poll(&repo).unwrap().is_some());
}
