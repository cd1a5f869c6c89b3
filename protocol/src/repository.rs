use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::*;

/// A decoded document together with its store metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub revision: u64,
    pub written_at: ServerTime,
    pub data: T,
}

impl<T: DeserializeOwned> Stored<T> {
    pub fn decode(doc: StoredDoc) -> Result<Self> {
        Ok(Self {
            id: doc.id,
            revision: doc.revision,
            written_at: doc.written_at,
            data: serde_json::from_value(doc.data)?,
        })
    }
}

/// Typed access to one game's collections.
pub struct Repository<S> {
    store: S,
    collections: Collections,
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S, collections: Collections) -> Self {
        Self { store, collections }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// The most recently created game, if any.
    pub fn latest_game(&self) -> Result<Option<Stored<GameDoc>>> {
        let snapshot = self.store.list(&self.collections.games())?;
        snapshot.docs.into_iter().last().map(Stored::decode).transpose()
    }

    pub fn game(&self, id: &str) -> Result<Option<Stored<GameDoc>>> {
        self.store
            .get(&DocPath::new(self.collections.games(), id))?
            .map(Stored::decode)
            .transpose()
    }

    pub fn put_game(&self, game: &GameDoc) -> Result<Stored<GameDoc>> {
        let path = DocPath::new(self.collections.games(), game.id.clone());
        let doc = self.store.set(&path, to_value(game)?)?;
        Stored::decode(doc)
    }

    /// Conditionally changes top-level game fields.
    pub fn update_game(&self, game: &Stored<GameDoc>, fields: Map<String, Value>) -> Result<Stored<GameDoc>> {
        let path = DocPath::new(self.collections.games(), game.id.clone());
        Stored::decode(self.store.update_if(&path, game.revision, fields)?)
    }

    pub fn moves(&self, game_id: &str) -> Result<(Vec<Stored<MoveDoc>>, SnapshotMetadata)> {
        self.list(&self.collections.moves_of(game_id))
    }

    /// Claims the move's cell unless another move already holds it.
    pub fn create_move(&self, game_id: &str, doc: &MoveDoc) -> Result<Stored<MoveDoc>> {
        let path = DocPath::new(
            self.collections.moves_of(game_id),
            move_doc_id(doc.player_move.coords()),
        );
        Stored::decode(self.store.create(&path, to_value(doc)?)?)
    }

    pub fn questions(&self, game_id: &str) -> Result<(Vec<Stored<QuestionDoc>>, SnapshotMetadata)> {
        self.list(&self.collections.questions_of(game_id))
    }

    pub fn post_question(&self, game_id: &str, doc: &QuestionDoc) -> Result<Stored<QuestionDoc>> {
        let path = DocPath::new(self.collections.questions_of(game_id), doc.id.clone());
        Stored::decode(self.store.create(&path, to_value(doc)?)?)
    }

    /// Marks the question closed. Exactly one caller per question succeeds.
    pub fn close_question(&self, game_id: &str, question: &Stored<QuestionDoc>) -> Result<Stored<QuestionDoc>> {
        let path = DocPath::new(self.collections.questions_of(game_id), question.id.clone());
        let mut fields = Map::new();
        fields.insert("isClosed".to_string(), Value::Bool(true));
        Stored::decode(self.store.update_if(&path, question.revision, fields)?)
    }

    pub fn answers(&self, game_id: &str) -> Result<(Vec<Stored<AnswerDoc>>, SnapshotMetadata)> {
        self.list(&self.collections.answers_of(game_id))
    }

    /// One answer per player and question; a second answer is refused.
    pub fn put_answer(&self, game_id: &str, doc: &AnswerDoc) -> Result<Stored<AnswerDoc>> {
        let path = DocPath::new(
            self.collections.answers_of(game_id),
            player_doc_id(&doc.question_id, &doc.player),
        );
        Stored::decode(self.store.create(&path, to_value(doc)?)?)
    }

    pub fn move_attempts(&self, game_id: &str) -> Result<(Vec<Stored<MoveAttemptDoc>>, SnapshotMetadata)> {
        self.list(&self.collections.move_attempts_of(game_id))
    }

    pub fn put_move_attempt(&self, game_id: &str, doc: &MoveAttemptDoc) -> Result<Stored<MoveAttemptDoc>> {
        let path = DocPath::new(
            self.collections.move_attempts_of(game_id),
            player_doc_id(&doc.question_id, &doc.player_move.player),
        );
        Stored::decode(self.store.set(&path, to_value(doc)?)?)
    }

    fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<(Vec<Stored<T>>, SnapshotMetadata)> {
        let snapshot = self.store.list(collection)?;
        let docs = snapshot
            .docs
            .into_iter()
            .map(Stored::decode)
            .collect::<Result<Vec<_>>>()?;
        Ok((docs, snapshot.metadata))
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
