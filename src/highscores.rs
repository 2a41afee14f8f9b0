//! High scores and the score-submission boundary
//!
//! `HighScores` is the local top-10 kept in LocalStorage. `ScoreService` is
//! the remote leaderboard and reward contract; `LocalScoreService` runs the
//! same rules in-process. Submissions complete into a `SubmissionSlot` that
//! the frame loop polls, so the tick never waits on the network.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::Millis;

/// Maximum number of high scores to keep locally
pub const MAX_HIGH_SCORES: usize = 10;
/// Entries returned by `fetch_leaderboard`
pub const LEADERBOARD_LIMIT: usize = 50;
/// Scores above this are rejected outright
pub const MAX_SUBMITTED_SCORE: u64 = 100_000;
/// One submission per address per window
pub const SUBMISSION_WINDOW_MS: Millis = 60_000;
/// Rate-limit entries older than this many windows are forgotten
pub const RATE_LIMIT_RETENTION_WINDOWS: Millis = 5;
/// Reward tokens per point
pub const REWARD_PER_POINT: f64 = 0.01;

/// A single local high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Local high score table
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "moloch_blaster_highscores";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the table
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Add a score if it qualifies. Returns the rank achieved.
    pub fn add_score(&mut self, score: u64, level: u32, timestamp: f64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let entry = HighScoreEntry {
            score,
            level,
            timestamp,
        };

        // Sorted descending by score
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY)
        {
            match serde_json::from_str::<HighScores>(&json) {
                Ok(scores) => {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    return scores;
                }
                Err(e) => log::warn!("Discarding unreadable high scores: {e}"),
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage
            && let Ok(json) = serde_json::to_string(self)
        {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::info!("High scores saved ({} entries)", self.entries.len());
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Failures at the score boundary. None of these touch simulation state.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Submission without an address
    MissingAddress,
    /// Score out of the accepted range (zero or above the ceiling)
    InvalidScore,
    RateLimited { retry_after_ms: Millis },
    /// Recorded, but only the top score earns a reward
    NotTopScore,
    Unavailable(String),
    Decode(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::MissingAddress => write!(f, "an address is required"),
            ServiceError::InvalidScore => {
                write!(f, "score must be between 1 and {MAX_SUBMITTED_SCORE}")
            }
            ServiceError::RateLimited { retry_after_ms } => write!(
                f,
                "one submission per minute, retry in {}s",
                retry_after_ms.div_ceil(1000)
            ),
            ServiceError::NotTopScore => {
                write!(f, "only the highest score can claim a reward")
            }
            ServiceError::Unavailable(why) => write!(f, "score service unavailable: {why}"),
            ServiceError::Decode(why) => write!(f, "malformed leaderboard data: {why}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// One row of the public leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub address: String,
    pub score: u64,
    pub timestamp: Millis,
}

/// Claimable reward for a new top score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    /// Tokens
    pub amount: f64,
    pub nonce: u64,
    pub signature: String,
}

/// Remote leaderboard and reward contract
pub trait ScoreService {
    /// Record `score` for `address`; a new top score also earns a reward
    fn submit_score(&mut self, address: &str, score: u64, now: Millis) -> Result<Reward, ServiceError>;

    /// Highest scores first, at most `LEADERBOARD_LIMIT`
    fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError>;
}

/// Signs reward claims
pub trait RewardSigner {
    fn sign(&self, address: &str, amount: f64, nonce: u64) -> String;

    /// Check a signature produced by `sign` for the same claim
    fn verify(&self, address: &str, amount: f64, nonce: u64, signature: &str) -> bool;
}

/// BLAKE3 keyed-hash signer for local play and tests.
///
/// The signature is the hex of `keyed_hash(key, claim)` and nothing else,
/// so the key never appears in what is handed out.
#[derive(Clone)]
pub struct DigestSigner {
    key: [u8; blake3::KEY_LEN],
}

impl DigestSigner {
    const KEY_CONTEXT: &'static str = "moloch-blaster 2024 reward signer key";

    pub fn new(key: [u8; blake3::KEY_LEN]) -> Self {
        Self { key }
    }

    /// Derive a signing key from a seed
    pub fn from_seed(seed: u64) -> Self {
        Self::new(blake3::derive_key(Self::KEY_CONTEXT, &seed.to_le_bytes()))
    }

    fn digest(&self, address: &str, amount: f64, nonce: u64) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        // Length prefix keeps address bytes from bleeding into the numbers
        hasher.update(&(address.len() as u64).to_le_bytes());
        hasher.update(address.as_bytes());
        hasher.update(&amount.to_bits().to_le_bytes());
        hasher.update(&nonce.to_le_bytes());
        hasher.finalize()
    }
}

impl fmt::Debug for DigestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestSigner").finish_non_exhaustive()
    }
}

impl RewardSigner for DigestSigner {
    fn sign(&self, address: &str, amount: f64, nonce: u64) -> String {
        format!("0x{}", self.digest(address, amount, nonce).to_hex())
    }

    fn verify(&self, address: &str, amount: f64, nonce: u64, signature: &str) -> bool {
        let Some(hex) = signature.strip_prefix("0x") else {
            return false;
        };
        // `Hash` equality is constant time
        blake3::Hash::from_hex(hex).is_ok_and(|h| h == self.digest(address, amount, nonce))
    }
}

/// Persisted part of a local board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BoardSnapshot {
    scores: Vec<LeaderboardEntry>,
    next_nonce: u64,
}

/// In-process score service with the live reward rules
#[derive(Debug, Clone)]
pub struct LocalScoreService<S> {
    scores: Vec<LeaderboardEntry>,
    /// Rate-limit memory, not persisted
    last_submission: HashMap<String, Millis>,
    next_nonce: u64,
    signer: S,
}

impl<S: RewardSigner> LocalScoreService<S> {
    pub fn new(signer: S) -> Self {
        Self {
            scores: Vec::new(),
            last_submission: HashMap::new(),
            next_nonce: 1,
            signer,
        }
    }

    /// Restore a board saved with `to_json`
    pub fn from_json(json: &str, signer: S) -> Result<Self, ServiceError> {
        let snapshot: BoardSnapshot =
            serde_json::from_str(json).map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(Self {
            scores: snapshot.scores,
            last_submission: HashMap::new(),
            next_nonce: snapshot.next_nonce.max(1),
            signer,
        })
    }

    pub fn to_json(&self) -> Result<String, ServiceError> {
        let snapshot = BoardSnapshot {
            scores: self.scores.clone(),
            next_nonce: self.next_nonce,
        };
        serde_json::to_string(&snapshot).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    fn check_rate_limit(&mut self, address: &str, now: Millis) -> Result<(), ServiceError> {
        let retention = SUBMISSION_WINDOW_MS * RATE_LIMIT_RETENTION_WINDOWS;
        self.last_submission
            .retain(|_, &mut last| now.saturating_sub(last) <= retention);

        if let Some(&last) = self.last_submission.get(address) {
            let elapsed = now.saturating_sub(last);
            if elapsed < SUBMISSION_WINDOW_MS {
                return Err(ServiceError::RateLimited {
                    retry_after_ms: SUBMISSION_WINDOW_MS - elapsed,
                });
            }
        }
        self.last_submission.insert(address.to_owned(), now);
        Ok(())
    }
}

impl<S: RewardSigner> ScoreService for LocalScoreService<S> {
    fn submit_score(&mut self, address: &str, score: u64, now: Millis) -> Result<Reward, ServiceError> {
        if address.is_empty() {
            return Err(ServiceError::MissingAddress);
        }
        if score == 0 {
            return Err(ServiceError::InvalidScore);
        }
        self.check_rate_limit(address, now)?;
        if score > MAX_SUBMITTED_SCORE {
            return Err(ServiceError::InvalidScore);
        }

        self.scores.push(LeaderboardEntry {
            address: address.to_owned(),
            score,
            timestamp: now,
        });
        let best = self.scores.iter().map(|e| e.score).max().unwrap_or(score);
        if score < best {
            log::debug!("score {score} recorded below top score {best}");
            return Err(ServiceError::NotTopScore);
        }

        let amount = score as f64 * REWARD_PER_POINT;
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        log::info!("new top score {score}: reward {amount} (nonce {nonce})");
        Ok(Reward {
            amount,
            nonce,
            signature: self.signer.sign(address, amount, nonce),
        })
    }

    fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let mut board = self.scores.clone();
        // Stable: equal scores keep submission order
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board.truncate(LEADERBOARD_LIMIT);
        Ok(board)
    }
}

/// Progress of an in-flight submission
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
    Done(Result<Reward, ServiceError>),
}

/// Shared cell an async submission completes into. The frame loop polls
/// it on later frames.
#[derive(Debug, Clone, Default)]
pub struct SubmissionSlot {
    inner: Rc<RefCell<SubmissionState>>,
}

impl SubmissionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a submission in flight. False if one already is.
    pub fn begin(&self) -> bool {
        let mut state = self.inner.borrow_mut();
        if *state == SubmissionState::Pending {
            return false;
        }
        *state = SubmissionState::Pending;
        true
    }

    pub fn complete(&self, result: Result<Reward, ServiceError>) {
        if let Err(e) = &result {
            log::warn!("score submission failed: {e}");
        }
        *self.inner.borrow_mut() = SubmissionState::Done(result);
    }

    pub fn is_pending(&self) -> bool {
        *self.inner.borrow() == SubmissionState::Pending
    }

    /// Take a finished result, leaving the slot idle
    pub fn take(&self) -> Option<Result<Reward, ServiceError>> {
        let mut state = self.inner.borrow_mut();
        match std::mem::take(&mut *state) {
            SubmissionState::Done(result) => Some(result),
            other => {
                *state = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> DigestSigner {
        DigestSigner::from_seed(7)
    }

    #[test]
    fn test_local_table_ranks() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.add_score(500, 2, 0.0), Some(1));
        assert_eq!(scores.add_score(900, 3, 0.0), Some(1));
        assert_eq!(scores.add_score(100, 1, 0.0), Some(3));
        assert_eq!(scores.top_score(), Some(900));
        for i in 0..20 {
            scores.add_score(1000 + i, 4, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert!(!scores.qualifies(900));
    }

    #[test]
    fn test_reward_for_top_score_only() {
        let mut service = LocalScoreService::new(signer());
        let reward = service.submit_score("0xaaa", 5000, 0).unwrap();
        assert_eq!(reward.amount, 50.0);
        assert_eq!(reward.nonce, 1);
        assert!(reward.signature.starts_with("0x"));

        assert_eq!(
            service.submit_score("0xbbb", 4000, 0),
            Err(ServiceError::NotTopScore)
        );
        let next = service.submit_score("0xccc", 6000, 0).unwrap();
        assert_eq!(next.nonce, 2);
        // Rejected submissions are still on the board
        assert_eq!(service.fetch_leaderboard().unwrap().len(), 3);
    }

    #[test]
    fn test_signature_verifies_only_under_its_key() {
        let mut service = LocalScoreService::new(signer());
        let reward = service.submit_score("0xaaa", 5000, 0).unwrap();
        let sig = &reward.signature;
        assert_eq!(sig.len(), 2 + 2 * blake3::OUT_LEN);

        assert!(signer().verify("0xaaa", reward.amount, reward.nonce, sig));
        let other = DigestSigner::from_seed(8);
        assert!(!other.verify("0xaaa", reward.amount, reward.nonce, sig));
        // Any change to the claim breaks it
        assert!(!signer().verify("0xbbb", reward.amount, reward.nonce, sig));
        assert!(!signer().verify("0xaaa", reward.amount * 2.0, reward.nonce, sig));
        assert!(!signer().verify("0xaaa", reward.amount, reward.nonce + 1, sig));
        assert!(!signer().verify("0xaaa", reward.amount, reward.nonce, "0xzz"));
    }

    #[test]
    fn test_signature_does_not_carry_the_key() {
        let key = [0xA5; blake3::KEY_LEN];
        let signer = DigestSigner::new(key);
        let key_hex: String = key.iter().map(|b| format!("{b:02x}")).collect();

        let mut service = LocalScoreService::new(signer.clone());
        let reward = service.submit_score("0xaaa", 5000, 0).unwrap();
        let sig = reward.signature.trim_start_matches("0x");
        assert!(!sig.contains(&key_hex[..16]));

        // No 64-bit word of the signature masks the key with the nonce
        let key_word = u64::from_le_bytes([0xA5; 8]);
        for chunk in sig.as_bytes().chunks(16) {
            let word = u64::from_str_radix(std::str::from_utf8(chunk).unwrap(), 16).unwrap();
            assert_ne!(word ^ reward.nonce, key_word);
        }
        // Same claim, same signature: nothing random leaks in either
        assert_eq!(reward.signature, signer.sign("0xaaa", reward.amount, reward.nonce));
        assert!(!format!("{signer:?}").contains("a5"));
    }

    #[test]
    fn test_zero_score_and_missing_address() {
        let mut service = LocalScoreService::new(signer());
        assert_eq!(
            service.submit_score("0xaaa", 0, 0),
            Err(ServiceError::InvalidScore)
        );
        assert_eq!(
            service.submit_score("", 500, 0),
            Err(ServiceError::MissingAddress)
        );
        assert!(service.fetch_leaderboard().unwrap().is_empty());
        // Rejected before the rate limit, so a real submission still goes through
        assert!(service.submit_score("0xaaa", 500, 1).is_ok());
    }

    #[test]
    fn test_rate_limit_memory_is_pruned() {
        let mut service = LocalScoreService::new(signer());
        for i in 0..20u64 {
            let _ = service.submit_score(&format!("0x{i}"), 10 + i, i);
        }
        assert_eq!(service.last_submission.len(), 20);

        let later = SUBMISSION_WINDOW_MS * RATE_LIMIT_RETENTION_WINDOWS + 100;
        let _ = service.submit_score("0xnew", 5, later);
        assert_eq!(service.last_submission.len(), 1);
        assert!(service.last_submission.contains_key("0xnew"));
    }

    #[test]
    fn test_score_ceiling() {
        let mut service = LocalScoreService::new(signer());
        assert_eq!(
            service.submit_score("0xaaa", MAX_SUBMITTED_SCORE + 1, 0),
            Err(ServiceError::InvalidScore)
        );
        assert!(service.fetch_leaderboard().unwrap().is_empty());
    }

    #[test]
    fn test_rate_limit_per_address() {
        let mut service = LocalScoreService::new(signer());
        service.submit_score("0xaaa", 10, 0).unwrap();
        assert_eq!(
            service.submit_score("0xaaa", 20, 45_000),
            Err(ServiceError::RateLimited {
                retry_after_ms: 15_000
            })
        );
        assert!(service.submit_score("0xbbb", 30, 45_000).is_ok());
        assert!(service.submit_score("0xaaa", 40, 60_000).is_ok());
    }

    #[test]
    fn test_leaderboard_order_and_limit() {
        let mut service = LocalScoreService::new(signer());
        for i in 0..60u64 {
            let _ = service.submit_score(&format!("0x{i}"), i * 10, i);
        }
        let board = service.fetch_leaderboard().unwrap();
        assert_eq!(board.len(), LEADERBOARD_LIMIT);
        assert_eq!(board[0].score, 590);
        assert!(board.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_service_round_trips_through_json() {
        let mut service = LocalScoreService::new(signer());
        service.submit_score("0xaaa", 700, 0).unwrap();
        let json = service.to_json().unwrap();
        let restored = LocalScoreService::from_json(&json, signer()).unwrap();
        assert_eq!(restored.fetch_leaderboard().unwrap()[0].score, 700);
        assert!(matches!(
            LocalScoreService::from_json("{nope", signer()),
            Err(ServiceError::Decode(_))
        ));
    }

    #[test]
    fn test_submission_slot() {
        let slot = SubmissionSlot::new();
        assert!(slot.take().is_none());
        assert!(slot.begin());
        assert!(!slot.begin());
        assert!(slot.take().is_none());
        slot.complete(Err(ServiceError::NotTopScore));
        assert_eq!(slot.take(), Some(Err(ServiceError::NotTopScore)));
        assert!(slot.take().is_none());

        assert!(slot.begin());
        assert!(slot.is_pending());
        slot.complete(Err(ServiceError::Unavailable("offline".into())));
        assert!(!slot.is_pending());
        assert!(matches!(slot.take(), Some(Err(ServiceError::Unavailable(_)))));
    }

    #[test]
    fn test_error_display() {
        let msg = ServiceError::RateLimited {
            retry_after_ms: 1500,
        }
        .to_string();
        assert!(msg.contains("2s"));
    }
}
