use std::rc::Rc;

use chrono::{DateTime, Utc};
use quizgrid_core::{
    Coord2, GameRules, GameSetup, GameSize, Level, MAX_PLAYERS, Pattern, PlayerId, Question,
    QuestionBank, QuestionKind, QuestionPhase, RaceOutcome, ReplayCursor, answer_value,
    eligible_cells, resolve_race, timeout_value,
};
use quizgrid_protocol::{
    AnswerDoc, Clock, DocumentStore, GameDoc, GameSnapshot, MoveAttemptDoc, MoveDoc, PLAYER_COLORS,
    PlayerDoc, PlayerMoveDoc, QuestionDoc, Repository, Stored, Watch, WatchUpdate,
};
use rand::prelude::*;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::*;

/// Conditional game updates are retried this many times before giving up.
const UPDATE_ATTEMPTS: usize = 3;

#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    pub rules: GameRules,
    /// Replace every posted question with a fixed one whose first answer is correct.
    pub test_mode: bool,
}

/// One player's client: keeps the local view in sync with the store and
/// performs that player's writes.
///
/// Store failures while writing are logged and otherwise ignored; the view
/// simply reflects whatever the store holds on the next refresh.
pub struct Session<S, K> {
    repo: Repository<S>,
    clock: Rc<dyn Clock>,
    identity: Identity<K>,
    bank: Rc<QuestionBank>,
    config: SessionConfig,
    rng: SmallRng,
    watch: Watch,
    cursor: Option<ReplayCursor>,
    state: AppState,
}

impl<S: DocumentStore, K: KeyValueStorage> Session<S, K> {
    pub fn new(
        repo: Repository<S>,
        clock: Rc<dyn Clock>,
        storage: K,
        bank: Rc<QuestionBank>,
        config: SessionConfig,
        seed: u64,
    ) -> Self {
        Self {
            repo,
            clock,
            identity: Identity::new(storage),
            bank,
            config,
            rng: SmallRng::seed_from_u64(seed),
            watch: Watch::new(),
            cursor: None,
            state: AppState::Loading,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> Option<&GameView> {
        self.state.view()
    }

    /// Color of the seat this client plays.
    pub fn color(&self) -> Option<&str> {
        self.identity.color()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms()).unwrap_or_default()
    }

    /// Reloads the game if the store changed. Returns whether the state changed.
    pub fn refresh(&mut self) -> bool {
        match self.watch.poll(&self.repo) {
            Ok(None) => false,
            Ok(Some(WatchUpdate::NoGame)) => {
                self.cursor = None;
                self.identity.clear();
                self.state = AppState::NoGame;
                true
            }
            Ok(Some(WatchUpdate::Game(snapshot))) => {
                self.apply(*snapshot);
                true
            }
            Err(err) => {
                log::error!("Could not load game: {err}");
                self.watch.reset();
                self.state = AppState::Failed(err.to_string());
                true
            }
        }
    }

    fn apply(&mut self, snapshot: GameSnapshot) {
        let roster = &snapshot.game.data.players;
        if self.identity.color().is_some() {
            self.identity.follow(roster);
        } else {
            self.identity.join(roster);
        }

        let moves = snapshot.moves.len();
        let cursor = match (self.state.view(), self.cursor) {
            (Some(view), Some(cursor)) if view.snapshot.id() == snapshot.id() && view.snapshot.moves.len() == moves => {
                cursor
            }
            _ => ReplayCursor::at_end(moves),
        };
        self.show(snapshot, cursor);
    }

    fn show(&mut self, snapshot: GameSnapshot, cursor: ReplayCursor) {
        let me = self.identity.color().and_then(|color| snapshot.player_id(color));
        self.cursor = Some(cursor);
        self.state = match GameView::build(snapshot, cursor, me, &self.config.rules) {
            Ok(view) => AppState::Ready(Box::new(view)),
            Err(err) => {
                log::error!("Could not build game view: {err}");
                AppState::Failed(err.to_string())
            }
        };
    }

    /// Creates a new game that replaces the current one for every client.
    pub fn start_new_game(&mut self, size: GameSize, player_count: u8) -> Result<()> {
        let count = usize::from(player_count.clamp(1, MAX_PLAYERS));
        let setup = GameSetup::random(size, &self.bank, &self.config.rules, self.rng.random())?;
        let players = PLAYER_COLORS[..count].iter().copied().map(PlayerDoc::new).collect();
        let game = GameDoc::new(
            Uuid::new_v4().to_string(),
            players,
            &setup.board,
            setup.question,
            self.now_utc(),
        );

        log::info!(
            "starting game {} ({}x{}, {count} players, level {})",
            game.id,
            size.rows,
            size.cols,
            setup.level
        );
        logged("create game", self.repo.put_game(&game));
        self.refresh();
        Ok(())
    }

    pub fn toggle_ready(&mut self) -> Result<()> {
        let color = self.seat()?;
        self.update_roster("toggle ready", |player| {
            if player.color == color {
                player.is_ready = !player.is_ready;
            }
        })?;
        self.refresh();
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let color = self.seat()?;
        let name = name.trim();
        let name = (!name.is_empty()).then(|| name.to_string());
        self.update_roster("rename player", |player| {
            if player.color == color {
                player.name = name.clone();
            }
        })?;
        self.refresh();
        Ok(())
    }

    /// Moves this client to the next seat. Only allowed before anything was
    /// asked, unless in test mode.
    pub fn cycle_player(&mut self) -> Result<()> {
        let view = self.state.view().ok_or(SessionError::NoGame)?;
        let snapshot = &view.snapshot;
        let started = !snapshot.questions.is_empty() || !snapshot.moves.is_empty();
        if started && !self.config.test_mode {
            return Err(SessionError::RosterLocked);
        }

        let roster = &snapshot.game.data.players;
        let next = match self.identity.color().and_then(|color| snapshot.game.data.player_index(color)) {
            Some(index) => (index + 1) % roster.len(),
            None => 0,
        };
        let player = roster.get(next).cloned().ok_or(SessionError::NotSeated)?;
        let (snapshot, cursor) = (snapshot.clone(), view.cursor);

        log::debug!("switching to {}", player.color);
        self.identity.choose(&player);
        self.show(snapshot, cursor);
        Ok(())
    }

    /// Starts a question for `cell`. Solo kinds reuse the game's question,
    /// competitive kinds draw one at the game's level.
    pub fn claim(&mut self, cell: Coord2, pattern: Pattern, kind: QuestionKind) -> Result<()> {
        let view = self.state.view().ok_or(SessionError::NoGame)?;
        view.check_claim(cell)?;
        let color = view.my_color().ok_or(SessionError::NotSeated)?.to_string();
        let game_id = view.snapshot.id().to_string();
        let game_question = view.snapshot.game.data.question.clone();

        let question = if kind.is_competitive() {
            self.bank.pick(game_question.level, &mut self.rng)?.clone()
        } else {
            game_question
        };

        log::info!("{color} claims {cell:?} with a {kind:?} question");
        self.post_question(&game_id, PlayerMoveDoc::new(color, cell, pattern), question, kind, None);
        self.refresh();
        Ok(())
    }

    /// Answers the current question with the answer at `choice`.
    pub fn answer(&mut self, choice: u8) -> Result<()> {
        let view = self.state.view().ok_or(SessionError::NoGame)?;
        let question = view.question.clone().ok_or(SessionError::NoQuestion)?;
        if !view.must_answer() {
            return Err(SessionError::NotAnswerer);
        }
        match view.question_phase(self.now_ms(), &self.config.rules) {
            Some(QuestionPhase::Open) => {}
            Some(phase) => return Err(SessionError::NotOpen(phase)),
            None => return Err(SessionError::NoQuestion),
        }
        if usize::from(choice) >= question.data.question.answers.len() {
            return Err(SessionError::InvalidAnswer(choice));
        }

        self.submit(&question.data, Some(choice));
        self.refresh();
        Ok(())
    }

    /// Runs timers and coordination. Call periodically; returns whether
    /// anything happened.
    pub fn tick(&mut self) -> bool {
        let mut acted = self.refresh();
        if self.expire_answer() {
            self.refresh();
            acted = true;
        }
        if self.coordinate() {
            self.refresh();
            acted = true;
        }
        acted
    }

    /// Sends the empty answer once this client's answer time has run out.
    fn expire_answer(&mut self) -> bool {
        let Some(view) = self.state.view() else {
            return false;
        };
        let expired = view.question_phase(self.now_ms(), &self.config.rules) == Some(QuestionPhase::Expired);
        let Some(question) = view.question.clone().filter(|_| expired && view.must_answer()) else {
            return false;
        };

        log::debug!("answer time for question {} ran out", question.id);
        self.submit(&question.data, None);
        true
    }

    /// Records this player's attempt, the move it earns if any, and the answer.
    /// `None` is the empty answer sent on timeout.
    fn submit(&mut self, question: &QuestionDoc, choice: Option<u8>) {
        let Some(view) = self.state.view() else {
            return;
        };
        let Some(color) = view.my_color().map(str::to_string) else {
            return;
        };
        let game_id = view.snapshot.id().to_string();
        let now = self.now_ms();
        let kind = question.question_type;

        let correct = question.question.is_correct(choice);
        let player_move = PlayerMoveDoc {
            player: color.clone(),
            ..question.player_move.clone()
        };

        let attempt = MoveAttemptDoc {
            question_id: question.id.clone(),
            player_move: player_move.clone(),
            is_correct: correct,
            move_attempt_date: question.timing().opens_at_ms(),
            question_type: kind,
        };
        logged("record move attempt", self.repo.put_move_attempt(&game_id, &attempt));

        let values = &self.config.rules.values;
        let value = match choice {
            Some(_) => answer_value(kind, values, question.player_move.player == color, correct),
            None => timeout_value(kind, values),
        };
        if let Some(value) = value {
            let coords = player_move.coords();
            let mv = MoveDoc {
                question_id: question.id.clone(),
                question_type: kind,
                player_move,
                value,
            };
            if logged("claim cell", self.repo.create_move(&game_id, &mv)).is_some() {
                log::info!("{color} takes {coords:?} for {value}");
            }
        }

        let answer = AnswerDoc {
            question_id: question.id.clone(),
            player: color,
            answer: choice.map_or(AnswerDoc::EMPTY, i32::from),
            client_date: now,
            think_time: choice.map_or(0, |_| now - question.posted_at),
        };
        logged("send answer", self.repo.put_answer(&game_id, &answer));
    }

    /// Closes a resolved question and performs what follows it. Only the
    /// client whose close succeeds continues, so every follow-up happens once.
    pub fn coordinate(&mut self) -> bool {
        let Some(view) = self.state.view() else {
            return false;
        };
        if view.outcome.is_over() {
            return false;
        }
        let snapshot = view.snapshot.clone();

        let Some(last) = snapshot.last_question() else {
            return self.open_game(&snapshot);
        };
        if last.data.is_closed || snapshot.current_question().is_some() {
            return false;
        }

        match self.repo.close_question(snapshot.id(), last) {
            Ok(_) => log::debug!("closed question {}", last.id),
            Err(err) if err.is_contention() => {
                log::debug!("question {} was closed by another client", last.id);
                return false;
            }
            Err(err) => {
                log::error!("Could not close question {}: {err}", last.id);
                return false;
            }
        }

        self.follow_up(&snapshot, &last.data);
        true
    }

    /// Nobody owns a cell yet, so the first player's client opens with a race.
    fn open_game(&mut self, snapshot: &GameSnapshot) -> bool {
        if !snapshot.game.data.all_ready() {
            return false;
        }
        let Some(mover) = snapshot.move_player() else {
            return false;
        };
        let Some(color) = snapshot.color_of(mover).filter(|color| Some(*color) == self.identity.color()) else {
            return false;
        };
        let board = match snapshot.board_at(snapshot.moves.len(), self.config.rules.value_mode) {
            Ok(board) => board,
            Err(err) => {
                log::error!("Could not replay game {}: {err}", snapshot.id());
                return false;
            }
        };
        let Some(cell) = board.first_free_cell() else {
            return false;
        };
        if !eligible_cells(&board, mover).is_empty() {
            return false;
        }

        log::info!("opening game {} with a race for {cell:?}", snapshot.id());
        let player_move = PlayerMoveDoc::new(color, cell, Pattern::Normal);
        let level = snapshot.game.data.question.level;
        let id = format!("{}-opening", snapshot.id());
        self.ask_race(snapshot.id(), player_move, level, Some(id))
    }

    fn follow_up(&mut self, snapshot: &GameSnapshot, last: &QuestionDoc) {
        let game_id = snapshot.id();
        let Some(mover) = snapshot.player_id(&last.player_move.player) else {
            log::error!("question {} was asked by an unknown player", last.id);
            return;
        };

        let players = usize::from(snapshot.player_count().max(1));
        let rotated = if snapshot.questions.len() % players == 0 {
            self.rotate_question(game_id, &snapshot.game.data.question.id)
        } else {
            None
        };
        let level = rotated.unwrap_or(snapshot.game.data.question.level);

        if last.question_type == QuestionKind::Race {
            let coords = last.player_move.coords();
            let attempts = snapshot.race_attempts(&last.id);
            let asked = snapshot.race_questions_for(coords);
            match resolve_race(&attempts, mover, asked, &self.config.rules.values) {
                RaceOutcome::Reask => {
                    log::debug!("race for {coords:?} is undecided, asking again");
                    self.ask_race(game_id, last.player_move.clone(), level, None);
                    return;
                }
                RaceOutcome::Award { player, value } => {
                    let Some(color) = snapshot.color_of(player) else {
                        return;
                    };
                    log::info!("{color} wins the race for {coords:?} for {value}");
                    let mv = MoveDoc {
                        question_id: last.id.clone(),
                        question_type: QuestionKind::Race,
                        player_move: PlayerMoveDoc {
                            player: color.to_string(),
                            ..last.player_move.clone()
                        },
                        value,
                    };
                    logged("award race", self.repo.create_move(game_id, &mv));
                }
            }
        }

        self.advance_turn(game_id, mover, level);
    }

    /// Passes the turn after `mover`, forcing a race when the next player has
    /// nowhere to move.
    fn advance_turn(&mut self, game_id: &str, mover: PlayerId, level: Level) {
        let Some(snapshot) = self.reload(game_id) else {
            return;
        };
        let board = match snapshot.board_at(snapshot.moves.len(), self.config.rules.value_mode) {
            Ok(board) => board,
            Err(err) => {
                log::error!("Could not replay game {game_id}: {err}");
                return;
            }
        };
        let Some(cell) = board.first_free_cell() else {
            log::info!("game {game_id} is over");
            return;
        };

        let next = mover.next(snapshot.player_count());
        let Some(color) = snapshot.color_of(next).map(str::to_string) else {
            return;
        };
        log::debug!("turn passes to {color}");
        self.update_game(game_id, "pass the turn", |_| {
            let mut fields = Map::new();
            fields.insert("movePlayer".to_string(), Value::String(color.clone()));
            fields
        });

        if eligible_cells(&board, next).is_empty() {
            log::debug!("{color} has no eligible cell, forcing a race for {cell:?}");
            let player_move = PlayerMoveDoc::new(color, cell, Pattern::Normal);
            self.ask_race(game_id, player_move, level, None);
        }
    }

    /// Replaces the game's shared question with another one from any level.
    fn rotate_question(&mut self, game_id: &str, current: &str) -> Option<Level> {
        let question = match self.bank.pick_other(current, &mut self.rng) {
            Ok(question) => question.clone(),
            Err(err) => {
                log::error!("Could not pick a question: {err}");
                return None;
            }
        };
        let level = question.level;
        self.update_game(game_id, "rotate the question", |_| {
            let mut fields = Map::new();
            fields.insert("question".to_string(), json!(question));
            fields
        })?;
        log::debug!("game {game_id} moves to level {level}");
        Some(level)
    }

    fn ask_race(&mut self, game_id: &str, player_move: PlayerMoveDoc, level: Level, id: Option<String>) -> bool {
        let question = match self.bank.pick(level, &mut self.rng) {
            Ok(question) => question.clone(),
            Err(err) => {
                log::error!("Could not pick a question: {err}");
                return false;
            }
        };
        self.post_question(game_id, player_move, question, QuestionKind::Race, id)
    }

    fn post_question(
        &mut self,
        game_id: &str,
        player_move: PlayerMoveDoc,
        question: Question,
        kind: QuestionKind,
        id: Option<String>,
    ) -> bool {
        let question = if self.config.test_mode {
            test_question(question)
        } else {
            question
        };
        let rules = &self.config.rules;
        let min = rules.open_delay_min_ms.min(rules.open_delay_max_ms);
        let max = rules.open_delay_max_ms.max(rules.open_delay_min_ms);

        let doc = QuestionDoc {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            posted_at: self.now_ms(),
            delay_time: self.rng.random_range(min..=max),
            player_move,
            question,
            question_type: kind,
            is_closed: false,
        };
        log::debug!(
            "posting question {} ({kind:?}) for {:?}",
            doc.id,
            doc.player_move.coords()
        );
        logged("post question", self.repo.post_question(game_id, &doc)).is_some()
    }

    fn reload(&self, game_id: &str) -> Option<GameSnapshot> {
        let loaded = self
            .repo
            .game(game_id)
            .and_then(|game| game.map(|game| GameSnapshot::load(&self.repo, game)).transpose());
        match loaded {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                log::error!("game {game_id} disappeared");
                None
            }
            Err(err) => {
                log::error!("Could not load game {game_id}: {err}");
                None
            }
        }
    }

    /// Conditionally updates the game document, re-reading it on conflicts.
    fn update_game(
        &self,
        game_id: &str,
        what: &str,
        fields: impl Fn(&GameDoc) -> Map<String, Value>,
    ) -> Option<Stored<GameDoc>> {
        for _ in 0..UPDATE_ATTEMPTS {
            let game = match self.repo.game(game_id) {
                Ok(Some(game)) => game,
                Ok(None) => {
                    log::error!("Could not {what}: game {game_id} does not exist");
                    return None;
                }
                Err(err) => {
                    log::error!("Could not {what}: {err}");
                    return None;
                }
            };
            match self.repo.update_game(&game, fields(&game.data)) {
                Ok(updated) => return Some(updated),
                Err(err) if err.is_contention() => log::debug!("retrying {what}: {err}"),
                Err(err) => {
                    log::error!("Could not {what}: {err}");
                    return None;
                }
            }
        }
        log::error!("Could not {what}: the game keeps changing");
        None
    }

    fn update_roster(&self, what: &str, edit: impl Fn(&mut PlayerDoc)) -> Result<()> {
        let game_id = self.view().ok_or(SessionError::NoGame)?.snapshot.id().to_string();
        self.update_game(&game_id, what, |game| {
            let mut players = game.players.clone();
            players.iter_mut().for_each(&edit);
            let mut fields = Map::new();
            fields.insert("players".to_string(), json!(players));
            fields
        });
        Ok(())
    }

    fn seat(&self) -> Result<String> {
        let view = self.view().ok_or(SessionError::NoGame)?;
        Ok(view.my_color().ok_or(SessionError::NotSeated)?.to_string())
    }

    pub fn step_back(&mut self) {
        self.move_cursor(ReplayCursor::prev);
    }

    pub fn step_forward(&mut self) {
        self.move_cursor(ReplayCursor::next);
    }

    /// Wheel navigation through the move history.
    pub fn scroll(&mut self, delta_y: f64) {
        self.move_cursor(|cursor| cursor.scroll(delta_y));
    }

    fn move_cursor(&mut self, step: impl FnOnce(ReplayCursor) -> ReplayCursor) {
        let Some(view) = self.state.view() else {
            return;
        };
        let cursor = step(view.cursor);
        if cursor != view.cursor {
            let snapshot = view.snapshot.clone();
            self.show(snapshot, cursor);
        }
    }
}

/// Logs a failed store write and drops it; losing a conditional write to
/// another client is expected and only logged at debug level.
fn logged<T>(what: &str, result: quizgrid_protocol::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if err.is_contention() => {
            log::debug!("Could not {what}, another client was first: {err}");
            None
        }
        Err(err) => {
            log::error!("Could not {what}: {err}");
            None
        }
    }
}
