use rand::Rng;
use satframe::frame::{Outcome, ParserContext, SYNC};

/// Random bytes that never contain a sync byte.
pub fn noise<R: Rng>(rng: &mut R, len: usize) -> Vec<u8> {
    (0..len)
        .map(|_| loop {
            let b: u8 = rng.gen();
            if b != SYNC {
                break b;
            }
        })
        .collect()
}

/// Push all of `dat`, collecting accepted payloads and counting rejected frames.
pub fn feed(ctx: &mut ParserContext, dat: &[u8]) -> (Vec<Vec<u8>>, usize) {
    let mut accepted = Vec::default();
    let mut rejected = 0;
    for b in dat {
        match ctx.push(*b) {
            Outcome::Accepted(payload) => accepted.push(payload.to_vec()),
            Outcome::Rejected { .. } => rejected += 1,
            Outcome::Incomplete => {}
        }
    }
    (accepted, rejected)
}
