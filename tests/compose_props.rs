use quickcheck::{quickcheck, Arbitrary, Gen, TestResult};

use ndlazy::{compose_1d, maybe_convert_to_slice, Indexer, Slice};

const SIZE: usize = 10;

/// Apply one canonical indexer to a sequence of positions, mirroring what a
/// backend would do, without going through composition.
fn apply(ix: &Indexer, base: &[isize]) -> Result<Vec<isize>, ()> {
    let resolve = |i: isize| -> Result<usize, ()> {
        let n = base.len() as isize;
        let j = if i < 0 { i + n } else { i };
        if j < 0 || j >= n {
            Err(())
        } else {
            Ok(j as usize)
        }
    };
    match ix {
        Indexer::Full => Ok(base.to_vec()),
        Indexer::Slice(s) => Ok(s
            .positions(base.len())
            .into_iter()
            .map(|i| base[i as usize])
            .collect()),
        Indexer::Index(i) => Ok(vec![base[resolve(*i)?]]),
        Indexer::IntArray(v) => v.iter().map(|&i| resolve(i).map(|j| base[j])).collect(),
        Indexer::BoolMask(_) => Err(()),
    }
}

fn identity() -> Vec<isize> {
    (0..SIZE as isize).collect()
}

#[derive(Clone, Debug)]
struct ArbSlice(Slice);

impl Arbitrary for ArbSlice {
    fn arbitrary(g: &mut Gen) -> ArbSlice {
        let start = (i8::arbitrary(g) as isize) % (SIZE as isize + 2);
        let end = if bool::arbitrary(g) {
            None
        } else {
            Some((i8::arbitrary(g) as isize) % (SIZE as isize + 2))
        };
        let mut step = (i8::arbitrary(g) as isize) % 4;
        if step == 0 {
            step = 1;
        }
        ArbSlice(Slice::new(start, end, step))
    }
}

/// An indexer that may appear as the already-applied side of a composition
/// (anything but a collapsing scalar).
#[derive(Clone, Debug)]
struct ArbOld(Indexer);

impl Arbitrary for ArbOld {
    fn arbitrary(g: &mut Gen) -> ArbOld {
        if bool::arbitrary(g) {
            ArbOld(Indexer::Slice(ArbSlice::arbitrary(g).0))
        } else {
            ArbOld(Indexer::IntArray(arb_positions(g)))
        }
    }
}

/// An indexer applied on top of an existing selection.
#[derive(Clone, Debug)]
struct ArbNew(Indexer);

impl Arbitrary for ArbNew {
    fn arbitrary(g: &mut Gen) -> ArbNew {
        match u8::arbitrary(g) % 4 {
            0 => ArbNew(Indexer::Full),
            1 => ArbNew(Indexer::Slice(ArbSlice::arbitrary(g).0)),
            2 => ArbNew(Indexer::Index((i8::arbitrary(g) as isize) % (SIZE as isize))),
            _ => ArbNew(Indexer::IntArray(arb_positions(g))),
        }
    }
}

fn arb_positions(g: &mut Gen) -> Vec<isize> {
    let len = usize::arbitrary(g) % 6;
    (0..len)
        .map(|_| {
            let n = SIZE as isize;
            (i8::arbitrary(g) as isize).rem_euclid(2 * n) - n
        })
        .collect()
}

quickcheck! {
    // materialize(compose(k1, k2)) == materialize(k2 applied to
    // materialize(k1)), and the two sides fail together.
    fn composition_law(old: ArbOld, new: ArbNew) -> TestResult {
        let base = identity();

        let sequential = apply(&old.0, &base).and_then(|mid| apply(&new.0, &mid));
        let fused = match compose_1d(&old.0, &new.0, SIZE) {
            Ok(ix) => apply(&ix, &base),
            Err(_) => Err(()),
        };

        match (sequential, fused) {
            (Ok(a), Ok(b)) => TestResult::from_bool(a == b),
            (Err(()), Err(())) => TestResult::passed(),
            _ => TestResult::failed(),
        }
    }

    // Compacting a position array to a slice never changes the selected
    // element sequence.
    fn slice_compaction_round_trip(values: Vec<i8>) -> TestResult {
        let n = SIZE as isize;
        let values: Vec<isize> = values
            .iter()
            .map(|&v| (v as isize).rem_euclid(2 * n) - n)
            .collect();

        let compacted = match maybe_convert_to_slice(&values, SIZE) {
            Ok(ix) => ix,
            Err(_) => return TestResult::discard(),
        };

        let base = identity();
        let raw = apply(&Indexer::IntArray(values), &base);
        let via_compacted = apply(&compacted, &base);
        TestResult::from_bool(raw == via_compacted)
    }

    // A progression within bounds always compacts to a slice.
    fn progressions_compact(start: u8, step: i8, len: u8) -> TestResult {
        let n = SIZE as isize;
        let start = (start as isize) % n;
        let step = (step as isize) % 4;
        let len = (len as usize) % 5 + 2;
        if step == 0 {
            return TestResult::discard();
        }
        let values: Vec<isize> = (0..len as isize).map(|i| start + i * step).collect();
        if values.iter().any(|&v| v < 0 || v >= n) {
            return TestResult::discard();
        }

        match maybe_convert_to_slice(&values, SIZE) {
            Ok(Indexer::Slice(s)) => TestResult::from_bool(s.positions(SIZE) == values),
            Ok(_) => TestResult::failed(),
            Err(_) => TestResult::failed(),
        }
    }
}
