//! Maps a final quiz score to a skill tier and an estimated percentile.

/// Scores are expected in `0..=MAX_SCORE`; anything above clamps.
pub const MAX_SCORE: u32 = 100;

/// Minimum score for a "win" framing on the result screen.
pub const WIN_THRESHOLD: u32 = 55;

/// `(score, percentile)` control points, ascending in both columns.
pub const PERCENTILE_TABLE: [(u32, u32); 7] = [
    (0, 10),
    (30, 25),
    (55, 50),
    (71, 75),
    (83, 90),
    (92, 98),
    (100, 99),
];

const PERCENTILE_CEILING: u32 = 99;

/// Skill bracket derived from the final score, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Novice,
    Beginner,
    Advanced,
    Expert,
    Master,
    Grandmaster,
}

impl Tier {
    /// Tiers from the highest band down, paired with their inclusive lower bound.
    pub const BANDS: [(u32, Tier); 6] = [
        (92, Tier::Grandmaster),
        (83, Tier::Master),
        (71, Tier::Expert),
        (55, Tier::Advanced),
        (30, Tier::Beginner),
        (0, Tier::Novice),
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Tier::Grandmaster => "宗师",
            Tier::Master => "大师",
            Tier::Expert => "高手",
            Tier::Advanced => "进阶",
            Tier::Beginner => "入门",
            Tier::Novice => "新手",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Tier::Grandmaster => "🔥",
            Tier::Master => "⭐",
            Tier::Expert => "💎",
            Tier::Advanced => "🏅",
            Tier::Beginner => "🥈",
            Tier::Novice => "🥉",
        }
    }

    /// Rank label (传奇, 钻石, 铂金, 黄金, 白银, 青铜).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tier::Grandmaster => "传奇",
            Tier::Master => "钻石",
            Tier::Expert => "铂金",
            Tier::Advanced => "黄金",
            Tier::Beginner => "白银",
            Tier::Novice => "青铜",
        }
    }

    /// Display color as a CSS hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Tier::Grandmaster => "#ff6b35",
            Tier::Master => "#b9f2ff",
            Tier::Expert => "#e5e4e2",
            Tier::Advanced => "#ffc800",
            Tier::Beginner => "#c0c0c0",
            Tier::Novice => "#cd7f32",
        }
    }

    #[must_use]
    pub fn min_score(self) -> u32 {
        Self::BANDS
            .iter()
            .find(|(_, tier)| *tier == self)
            .map_or(0, |(min, _)| *min)
    }
}

/// Tier for a score. Lower bounds are inclusive.
#[must_use]
pub fn tier_of(score: u32) -> Tier {
    let score = score.min(MAX_SCORE);
    Tier::BANDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map_or(Tier::Novice, |(_, tier)| *tier)
}

/// Percentile estimate, linearly interpolated between control points and
/// rounded to the nearest integer.
#[must_use]
pub fn percentile_of(score: u32) -> u32 {
    for pair in PERCENTILE_TABLE.windows(2) {
        let (s0, p0) = pair[0];
        let (s1, p1) = pair[1];
        if (s0..=s1).contains(&score) {
            let t = f64::from(score - s0) / f64::from(s1 - s0);
            let value = f64::from(p0) + t * (f64::from(p1) - f64::from(p0));
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let rounded = value.round() as u32;
            return rounded;
        }
    }
    PERCENTILE_CEILING
}

#[must_use]
pub fn is_win(score: u32) -> bool {
    score >= WIN_THRESHOLD
}

/// Everything the result screen derives from a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizResult {
    pub score: u32,
    pub tier: Tier,
    pub percentile: u32,
    pub win: bool,
}

impl QuizResult {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        Self {
            score,
            tier: tier_of(score),
            percentile: percentile_of(score),
            win: is_win(score),
        }
    }

    /// Filled stars out of five, `round(score / 20)`.
    #[must_use]
    pub fn stars(&self) -> u32 {
        (self.score.min(MAX_SCORE) + 10) / 20
    }

    #[must_use]
    pub fn headline(&self) -> &'static str {
        if self.win { "优秀" } else { "继续加油" }
    }
}
