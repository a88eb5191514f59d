//! `AnswerTrie` and the per-pattern `SubgoalEntry` (spec §3 "SLG entities",
//! §4.9). Grounded on `chalk-engine`'s `Table` (an answer list plus a
//! monotone generation counter consumers poll) generalized here to a real
//! blocking wait via a `parking_lot::Condvar` instead of a re-poll loop, and
//! on the teacher's `VarID` atomic-counter idiom for the status field.
use super::pattern::{CallPattern, PatternHash};
use crate::error::{CancellationToken, Result};
use crate::term::Term;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU8, Ordering};

pub type DelaySet = HashSet<PatternHash>;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SubgoalStatus {
    Active,
    Complete,
    Failed,
    Invalidated,
}

impl SubgoalStatus {
    fn to_u8(self) -> u8 {
        match self {
            SubgoalStatus::Active => 0,
            SubgoalStatus::Complete => 1,
            SubgoalStatus::Failed => 2,
            SubgoalStatus::Invalidated => 3,
        }
    }

    fn from_u8(v: u8) -> SubgoalStatus {
        match v {
            1 => SubgoalStatus::Complete,
            2 => SubgoalStatus::Failed,
            3 => SubgoalStatus::Invalidated,
            _ => SubgoalStatus::Active,
        }
    }
}

/// Answers for one subgoal, in insertion order. A retracted index is kept
/// in place (not removed) so existing delay-set references by index stay
/// valid; WFS-aware scans simply skip it (spec §4.10 "retracted set").
#[derive(Default)]
struct AnswerTrie {
    answers: Vec<Term>,
    seen: HashSet<Term>,
    delay_sets: HashMap<usize, DelaySet>,
    retracted: HashSet<usize>,
}

impl AnswerTrie {
    /// Inserts `answer`, deduplicating by structural equality; returns
    /// `false` for a duplicate.
    fn insert(&mut self, answer: Term, delay: DelaySet) -> bool {
        if !self.seen.insert(answer.clone()) {
            return false;
        }
        let idx = self.answers.len();
        self.answers.push(answer);
        if !delay.is_empty() {
            self.delay_sets.insert(idx, delay);
        }
        true
    }
}

/// Per-call-pattern tabling state: the answer trie, a monotone change
/// counter any number of consumers can block on, and a status.
pub struct SubgoalEntry {
    pub pattern: CallPattern,
    hash: PatternHash,
    status: AtomicU8,
    trie: Mutex<AnswerTrie>,
    seq: Mutex<u64>,
    cv: Condvar,
    started_tx: Mutex<Option<Sender<()>>>,
    started_rx: Receiver<()>,
}

impl SubgoalEntry {
    pub fn new(pattern: CallPattern) -> SubgoalEntry {
        let hash = pattern.hash();
        let (tx, rx) = bounded(0);
        SubgoalEntry {
            pattern,
            hash,
            status: AtomicU8::new(SubgoalStatus::Active.to_u8()),
            trie: Mutex::new(AnswerTrie::default()),
            seq: Mutex::new(0),
            cv: Condvar::new(),
            started_tx: Mutex::new(Some(tx)),
            started_rx: rx,
        }
    }

    pub fn hash(&self) -> PatternHash {
        self.hash
    }

    pub fn status(&self) -> SubgoalStatus {
        SubgoalStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, s: SubgoalStatus) {
        self.status.store(s.to_u8(), Ordering::SeqCst);
    }

    /// A handle that closes (all clones wake with `RecvError`) once the
    /// producer signals it has begun running.
    pub fn started_channel(&self) -> Receiver<()> {
        self.started_rx.clone()
    }

    pub fn signal_started(&self) {
        self.started_tx.lock().take();
    }

    pub fn change_seq(&self) -> u64 {
        *self.seq.lock()
    }

    fn bump(&self) {
        let mut seq = self.seq.lock();
        *seq += 1;
        self.cv.notify_all();
    }

    /// Blocks until `change_seq()` advances past `since`, or `ctx` is
    /// cancelled. Ordering guarantee: a change bumped after `since` was
    /// read under the same lock this wait acquires cannot be missed (spec
    /// §5 "changeSeq is strictly monotone").
    pub fn wait_change_since(&self, since: u64, ctx: &CancellationToken) -> Result<u64> {
        let mut seq = self.seq.lock();
        loop {
            if *seq > since {
                return Ok(*seq);
            }
            ctx.check()?;
            self.cv.wait_for(&mut seq, std::time::Duration::from_millis(20));
        }
    }

    pub fn insert_answer(&self, answer: Term, delay: DelaySet) {
        let inserted = self.trie.lock().insert(answer, delay);
        if inserted {
            self.bump();
        }
    }

    pub fn answer_count(&self) -> usize {
        self.trie.lock().answers.len()
    }

    pub fn total_raw_len(&self) -> usize {
        self.trie.lock().answers.len()
    }

    /// Collects up to `n` live (non-retracted) answers starting at raw
    /// index `from`, returning the answers and the raw index to resume
    /// scanning from on the next call.
    pub fn scan_from(&self, from: usize, n: usize) -> (Vec<Term>, usize) {
        let trie = self.trie.lock();
        let mut out = Vec::new();
        let mut idx = from;
        while idx < trie.answers.len() && out.len() < n {
            if !trie.retracted.contains(&idx) {
                out.push(trie.answers[idx].clone());
            }
            idx += 1;
        }
        (out, idx)
    }

    pub fn finish(&self, status: SubgoalStatus) {
        self.set_status(status);
        self.signal_started();
        self.bump();
    }

    pub fn invalidate(&self) {
        self.set_status(SubgoalStatus::Invalidated);
        self.bump();
    }

    /// Completion propagation (spec §4.10): a child that completed with at
    /// least one answer retracts every answer here whose delay set names
    /// it.
    pub fn retract_depending_on(&self, child: PatternHash) {
        let mut trie = self.trie.lock();
        let hit: Vec<usize> = trie
            .delay_sets
            .iter()
            .filter(|(_, set)| set.contains(&child))
            .map(|(idx, _)| *idx)
            .collect();
        if hit.is_empty() {
            return;
        }
        for idx in hit {
            trie.retracted.insert(idx);
        }
        drop(trie);
        self.bump();
    }

    /// Completion propagation: a child that completed with zero answers
    /// drops itself from every delay set here that names it (the answer
    /// becomes unconditional once its delay set is empty).
    pub fn simplify_remove(&self, child: PatternHash) {
        let mut trie = self.trie.lock();
        let mut changed = false;
        for set in trie.delay_sets.values_mut() {
            changed |= set.remove(&child);
        }
        drop(trie);
        if changed {
            self.bump();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::CancellationToken;

    #[test]
    fn duplicate_answers_are_not_reinserted() {
        let entry = SubgoalEntry::new(CallPattern::new(1, Term::var("x")));
        entry.insert_answer(Term::atom(1), DelaySet::new());
        entry.insert_answer(Term::atom(1), DelaySet::new());
        assert_eq!(entry.answer_count(), 1);
    }

    #[test]
    fn retraction_hides_answer_from_scan() {
        let entry = SubgoalEntry::new(CallPattern::new(1, Term::var("x")));
        let mut delay = DelaySet::new();
        delay.insert(99);
        entry.insert_answer(Term::atom(1), delay);
        entry.retract_depending_on(99);
        let (live, _) = entry.scan_from(0, 10);
        assert!(live.is_empty());
    }

    #[test]
    fn wait_change_since_unblocks_on_bump() {
        let entry = std::sync::Arc::new(SubgoalEntry::new(CallPattern::new(1, Term::var("x"))));
        let pre = entry.change_seq();
        let writer = entry.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(5));
            writer.insert_answer(Term::atom(1), DelaySet::new());
        });
        let ctx = CancellationToken::new();
        let seq = entry.wait_change_since(pre, &ctx).unwrap();
        assert!(seq > pre);
    }
}
