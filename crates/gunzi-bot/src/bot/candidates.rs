use super::{face_groups, legal_fallback, sort_weakest_first};
use gunzi_core::{Card, GameEngine, Seat};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Upper bound on distinct combinations enumerated for one multi-card follow.
pub const ENUMERATION_CAP: usize = 50;

pub(crate) type FaceSignature = Vec<(u8, u8)>;

/// Order-free face multiset of a play; two plays with equal signatures are
/// interchangeable for the search.
pub(crate) fn signature(cards: &[Card]) -> FaceSignature {
    let mut faces: FaceSignature = cards.iter().map(|card| card.face_key()).collect();
    faces.sort_unstable();
    faces
}

/// Legal plays worth searching for `seat`, at most `cap` of them and at most
/// one per face combination. The weakest legal play always comes first and
/// survives the cap; the rest are drawn at random when over the cap.
pub fn generate_candidates<R: Rng + ?Sized>(
    engine: &GameEngine,
    seat: Seat,
    cap: usize,
    rng: &mut R,
) -> Vec<Vec<Card>> {
    let Some(trump) = engine.trump_info() else {
        return Vec::new();
    };
    let hand = engine.hand(seat);
    let required = engine.required_count();
    let mut seen: HashSet<FaceSignature> = HashSet::new();
    let mut raw: Vec<Vec<Card>> = vec![legal_fallback(engine, seat)];

    if required <= 1 {
        for group in face_groups(hand) {
            raw.push(vec![group[0]]);
            if required == 0 {
                for size in 2..=group.len().min(3) {
                    raw.push(group[..size].to_vec());
                }
            }
        }
    } else {
        let lead_suit = engine.lead_suit();
        let (mut suit, mut other): (Vec<Card>, Vec<Card>) = hand
            .iter()
            .copied()
            .partition(|card| trump.effective_suit(*card) == lead_suit);
        sort_weakest_first(&mut suit, &trump);
        sort_weakest_first(&mut other, &trump);
        let (pool, forced) = if suit.len() >= required {
            (suit, Vec::new())
        } else {
            (other, suit)
        };
        let k = required - forced.len();
        let mut strongest = forced.clone();
        strongest.extend_from_slice(&pool[pool.len().saturating_sub(k)..]);
        seen.insert(signature(&raw[0]));
        if seen.insert(signature(&strongest)) {
            raw.push(strongest);
        }
        combinations(&pool, k, &forced, &mut raw, &mut seen, rng);
    }

    let mut candidates: Vec<Vec<Card>> = Vec::with_capacity(raw.len());
    let mut kept: HashSet<FaceSignature> = HashSet::new();
    for play in raw {
        if engine.is_valid_play(seat, &play) && kept.insert(signature(&play)) {
            candidates.push(play);
        }
    }
    if candidates.len() > cap {
        let fixed = usize::from(!candidates.is_empty() && cap > 0);
        candidates[fixed..].shuffle(rng);
        candidates.truncate(cap);
    }
    candidates
}

/// Appends `forced` plus distinct `k`-subsets of `cards` until
/// [`ENUMERATION_CAP`] plays exist. Small pools are walked exhaustively;
/// larger ones are sampled so every card has the same chance to appear.
fn combinations<R: Rng + ?Sized>(
    cards: &[Card],
    k: usize,
    forced: &[Card],
    out: &mut Vec<Vec<Card>>,
    seen: &mut HashSet<FaceSignature>,
    rng: &mut R,
) {
    fn walk(
        cards: &[Card],
        k: usize,
        start: usize,
        current: &mut Vec<Card>,
        out: &mut Vec<Vec<Card>>,
        seen: &mut HashSet<FaceSignature>,
    ) {
        if out.len() >= ENUMERATION_CAP {
            return;
        }
        if current.len() == k {
            if seen.insert(signature(current)) {
                out.push(current.clone());
            }
            return;
        }
        for index in start..cards.len() {
            current.push(cards[index]);
            walk(cards, k, index + 1, current, out, seen);
            current.pop();
        }
    }

    if subset_count(cards.len(), k) <= ENUMERATION_CAP {
        let mut current = forced.to_vec();
        walk(cards, k + forced.len(), 0, &mut current, out, seen);
        return;
    }

    let attempts = ENUMERATION_CAP * 4;
    for _ in 0..attempts {
        if out.len() >= ENUMERATION_CAP {
            break;
        }
        let mut play = forced.to_vec();
        play.extend(cards.choose_multiple(rng, k).copied());
        if seen.insert(signature(&play)) {
            out.push(play);
        }
    }
}

/// `n` choose `k`, saturating once it passes [`ENUMERATION_CAP`].
fn subset_count(n: usize, k: usize) -> usize {
    let k = k.min(n - k.min(n));
    let mut count = 1usize;
    for step in 0..k {
        count = count * (n - step) / (step + 1);
        if count > ENUMERATION_CAP {
            return usize::MAX;
        }
    }
    count
}
