/// Source of uniform random values in `[0, 1)`.
///
/// Every stochastic step of the game (terrain draws, spawn sampling, recruit
/// order, enemy move choice) pulls from one of these so that whole games can
/// be replayed from a seed or a fixed list of draws.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform index in `0..len`, `floor(r * len)`.
    fn below(&mut self, len: usize) -> usize {
        let index = (self.next_f64() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.below(items.len()))
        }
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}

impl RandomSource for fastrand::Rng {
    fn next_f64(&mut self) -> f64 {
        self.f64()
    }
}

/// Adapts a closure, e.g. `RandomFn(|| 0.5)`.
pub struct RandomFn<F>(pub F);

impl<F> RandomSource for RandomFn<F>
where
    F: FnMut() -> f64,
{
    fn next_f64(&mut self) -> f64 {
        (self.0)()
    }
}

/// Replays a fixed list of draws, then yields `0.0` forever.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    values: Vec<f64>,
    index: usize,
}

impl Sequence {
    pub fn new(values: &[f64]) -> Self {
        Sequence {
            values: values.to_vec(),
            index: 0,
        }
    }
    pub fn consumed(&self) -> usize {
        self.index
    }
}

impl RandomSource for Sequence {
    fn next_f64(&mut self) -> f64 {
        let value = self.values.get(self.index).copied().unwrap_or(0.0);
        self.index += 1;
        value
    }
}
