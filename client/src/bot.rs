use std::rc::Rc;

use quizgrid_core::{GameSize, Pattern, Question, QuestionBank, QuestionKind, QuestionPhase};
use quizgrid_protocol::{Collections, DocumentStore, ManualClock, MemoryStore, Repository};
use rand::prelude::*;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BotConfig {
    /// Chance of picking the correct answer outside test mode.
    pub accuracy: f64,
    pub think_min_ms: i64,
    pub think_max_ms: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            accuracy: 0.7,
            think_min_ms: 500,
            think_max_ms: 8_000,
        }
    }
}

/// Plays one seat: gets ready, claims random eligible cells and answers after
/// a random think time.
#[derive(Debug)]
pub struct Bot {
    rng: SmallRng,
    config: BotConfig,
    /// Question being thought about and when the answer is due.
    thinking: Option<(String, i64)>,
}

impl Bot {
    pub fn new(seed: u64, config: BotConfig) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            config,
            thinking: None,
        }
    }

    /// Takes at most one action for `session`. Returns whether it did.
    pub fn act<S: DocumentStore, K: KeyValueStorage>(&mut self, session: &mut Session<S, K>) -> bool {
        let Some(view) = session.view() else {
            return false;
        };
        let now = session.now_ms();

        if !view.all_ready() {
            let ready = view
                .me
                .and_then(|me| view.snapshot.game.data.players.get(me.index()))
                .is_some_and(|player| player.is_ready);
            return !ready && log_refusal(session.toggle_ready());
        }

        if let Some(question) = &view.question {
            let open = view.question_phase(now, &session.config().rules) == Some(QuestionPhase::Open);
            if !view.must_answer() || !open {
                return false;
            }
            let due = match &self.thinking {
                Some((id, due)) if *id == question.id => *due,
                _ => {
                    let due = now + self.rng.random_range(self.config.think_min_ms..=self.config.think_max_ms);
                    self.thinking = Some((question.id.clone(), due));
                    due
                }
            };
            if now < due {
                return false;
            }
            let choice = self.choose(&question.data.question, session.config().test_mode);
            return log_refusal(session.answer(choice));
        }

        if !view.is_my_turn() || !view.cursor.is_last() {
            return false;
        }
        let Some(&cell) = view.eligible.choose(&mut self.rng) else {
            return false;
        };
        let pattern = *Pattern::ALL.choose(&mut self.rng).unwrap_or(&Pattern::Normal);
        let kind = *QuestionKind::ALL.choose(&mut self.rng).unwrap_or(&QuestionKind::Safe);
        log_refusal(session.claim(cell, pattern, kind))
    }

    fn choose(&mut self, question: &Question, test_mode: bool) -> u8 {
        if test_mode || self.rng.random_bool(self.config.accuracy.clamp(0.0, 1.0)) {
            return question.correct;
        }
        let count = question.answers.len().clamp(1, usize::from(u8::MAX));
        self.rng.random_range(0..count) as u8
    }
}

fn log_refusal(result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::debug!("bot action refused: {err}");
            false
        }
    }
}

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub session: SessionConfig,
    pub bot: BotConfig,
    pub seed: u64,
    /// Simulated time between rounds.
    pub step_ms: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            bot: BotConfig::default(),
            seed: 0,
            step_ms: 250,
        }
    }
}

/// A whole game between bots sharing one in-memory store and a manual clock.
pub struct Simulation {
    clock: Rc<ManualClock>,
    store: Rc<MemoryStore>,
    seats: Vec<(Session<Rc<MemoryStore>, MemoryStorage>, Bot)>,
    step_ms: i64,
    rounds: u32,
}

impl Simulation {
    /// Creates the game and seats one bot per player.
    pub fn start(config: SimulationConfig, bank: QuestionBank, size: GameSize, players: u8) -> Result<Self> {
        let clock = Rc::new(ManualClock::new(0));
        let store = Rc::new(MemoryStore::new(clock.clone()));
        let bank = Rc::new(bank);

        let mut seats: Vec<_> = (0..players.max(1))
            .map(|seat| {
                let seed = config.seed.wrapping_add(u64::from(seat));
                let session = Session::new(
                    Repository::new(store.clone(), Collections::default()),
                    clock.clone(),
                    MemoryStorage::new(),
                    bank.clone(),
                    config.session.clone(),
                    seed,
                );
                (session, Bot::new(seed.rotate_left(17), config.bot))
            })
            .collect();

        if let Some((host, _)) = seats.first_mut() {
            host.start_new_game(size, players)?;
        }
        for (index, (session, _)) in seats.iter_mut().enumerate() {
            session.refresh();
            for _ in 0..index {
                session.cycle_player()?;
            }
        }

        Ok(Self {
            clock,
            store,
            seats,
            step_ms: config.step_ms,
            rounds: 0,
        })
    }

    pub fn store(&self) -> &Rc<MemoryStore> {
        &self.store
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session<Rc<MemoryStore>, MemoryStorage>> {
        self.seats.iter().map(|(session, _)| session)
    }

    /// The first seat's view of the game.
    pub fn view(&self) -> Option<&GameView> {
        self.seats.first()?.0.view()
    }

    pub fn is_over(&self) -> bool {
        self.view().is_some_and(|view| view.outcome.is_over())
    }

    /// Advances the clock and lets every seat tick and act once.
    pub fn round(&mut self) {
        self.clock.advance(self.step_ms);
        for (session, bot) in &mut self.seats {
            session.tick();
            if bot.act(session) {
                session.tick();
            }
        }
        self.rounds += 1;
    }

    /// Plays until the board is full or `max_rounds` have passed. Returns
    /// whether the game finished.
    pub fn run(&mut self, max_rounds: u32) -> bool {
        while !self.is_over() && self.rounds < max_rounds {
            self.round();
        }
        for (session, _) in &mut self.seats {
            session.refresh();
        }
        self.is_over()
    }
}
