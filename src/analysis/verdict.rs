use crate::models::config::ClassifierConfig;
use crate::models::snapshot::{Verdict, MAX_SCORE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ORDERED_TIERS: [Verdict; 4] = [
    Verdict::VeryActive,
    Verdict::Active,
    Verdict::Stable,
    Verdict::Declining,
];

/// Map a composite score onto its tier. Bounds are inclusive upper limits,
/// anything above the last one is abandoned.
pub fn classify(score: Option<f64>, config: &ClassifierConfig) -> Verdict {
    let Some(score) = score else {
        return Verdict::InsufficientData;
    };

    config
        .tier_bounds
        .iter()
        .zip(ORDERED_TIERS)
        .find(|(bound, _)| score <= **bound)
        .map(|(_, verdict)| verdict)
        .unwrap_or(Verdict::Abandoned)
}

pub fn commentary_bucket(score: Option<f64>, buckets: usize) -> Option<usize> {
    let score = score?;
    if buckets == 0 {
        return None;
    }
    let raw = (score / MAX_SCORE * buckets as f64).floor().max(0.0) as usize;
    Some(raw.min(buckets - 1))
}

/// Picks an index in `0..len`. Injected so commentary stays testable.
pub trait Chooser {
    fn pick(&mut self, len: usize) -> usize;
}

pub struct RandomChooser {
    rng: StdRng,
}

impl RandomChooser {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomChooser {
    fn default() -> Self {
        Self::new()
    }
}

impl Chooser for RandomChooser {
    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

/// Display lines per commentary bucket, healthiest bucket first.
#[derive(Debug, Clone)]
pub struct CommentaryCatalog {
    buckets: Vec<Vec<String>>,
}

impl CommentaryCatalog {
    pub fn new(buckets: Vec<Vec<String>>) -> Self {
        Self { buckets }
    }

    pub fn lines(&self, bucket: usize) -> &[String] {
        self.buckets.get(bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pick(&self, bucket: usize, chooser: &mut dyn Chooser) -> Option<&str> {
        let lines = self.lines(bucket);
        if lines.is_empty() {
            return None;
        }
        let index = chooser.pick(lines.len()).min(lines.len() - 1);
        Some(lines[index].as_str())
    }
}

impl Default for CommentaryCatalog {
    fn default() -> Self {
        let bucket = |lines: &[&str]| -> Vec<String> {
            lines.iter().map(|line| line.to_string()).collect()
        };
        Self::new(vec![
            bucket(&[
                "Alive and kicking.",
                "Busier than ever.",
                "Nowhere near the graveyard.",
            ]),
            bucket(&[
                "Still has a pulse.",
                "Quieter, but holding on.",
                "Middle-aged and comfortable.",
            ]),
            bucket(&[
                "Pulse is getting faint.",
                "The crowd is moving on.",
                "Mostly maintenance mode now.",
            ]),
            bucket(&[
                "Flatlined.",
                "Somebody should write the eulogy.",
                "Last one out, turn off the lights.",
            ]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl Chooser for Fixed {
        fn pick(&mut self, _len: usize) -> usize {
            self.0
        }
    }

    #[test]
    fn tiers_use_inclusive_upper_bounds() {
        let config = ClassifierConfig::default();
        assert_eq!(classify(Some(0.0), &config), Verdict::VeryActive);
        assert_eq!(classify(Some(2.0), &config), Verdict::VeryActive);
        assert_eq!(classify(Some(2.01), &config), Verdict::Active);
        assert_eq!(classify(Some(6.0), &config), Verdict::Stable);
        assert_eq!(classify(Some(8.0), &config), Verdict::Declining);
        assert_eq!(classify(Some(8.5), &config), Verdict::Abandoned);
        assert_eq!(classify(None, &config), Verdict::InsufficientData);
    }

    #[test]
    fn buckets_split_the_range_evenly() {
        assert_eq!(commentary_bucket(Some(0.0), 4), Some(0));
        assert_eq!(commentary_bucket(Some(2.49), 4), Some(0));
        assert_eq!(commentary_bucket(Some(2.5), 4), Some(1));
        assert_eq!(commentary_bucket(Some(7.5), 4), Some(3));
        assert_eq!(commentary_bucket(Some(10.0), 4), Some(3));
        assert_eq!(commentary_bucket(None, 4), None);
    }

    #[test]
    fn catalog_picks_from_the_bucket() {
        let catalog = CommentaryCatalog::default();
        let mut chooser = RandomChooser::seeded(7);
        for bucket in 0..4 {
            let line = catalog.pick(bucket, &mut chooser).expect("bucket has lines");
            assert!(catalog.lines(bucket).iter().any(|l| l == line));
        }
        assert_eq!(catalog.pick(9, &mut chooser), None);
    }

    #[test]
    fn stub_chooser_is_deterministic_and_bounded() {
        let catalog = CommentaryCatalog::default();
        assert_eq!(catalog.pick(3, &mut Fixed(1)), Some("Somebody should write the eulogy."));
        assert_eq!(catalog.pick(0, &mut Fixed(99)), Some("Nowhere near the graveyard."));
    }
}
