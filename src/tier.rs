use strum::{Display, EnumIter};

/// Score bands used for colors and fallback copy across the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ScoreTier {
    Elite,
    Excellent,
    Solid,
    Good,
    Acceptable,
    Weak,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => Self::Elite,
            s if s >= 8.5 => Self::Excellent,
            s if s >= 8.0 => Self::Solid,
            s if s >= 7.5 => Self::Good,
            s if s >= 7.0 => Self::Acceptable,
            _ => Self::Weak,
        }
    }

    /// Tailwind gradient classes used by the homepage cards.
    pub fn gradient(&self) -> &'static str {
        match self {
            Self::Elite => "from-orange-500 to-red-600",
            Self::Excellent => "from-indigo-500 to-purple-600",
            Self::Solid => "from-blue-500 to-cyan-600",
            Self::Good => "from-green-500 to-emerald-600",
            Self::Acceptable => "from-yellow-500 to-orange-600",
            Self::Weak => "from-gray-500 to-gray-600",
        }
    }

    pub fn fallback_verdict(&self) -> &'static str {
        match self {
            Self::Elite => "Best overall design quality",
            Self::Excellent => "Excellent choice for most",
            Self::Solid => "Solid with minor drawbacks",
            Self::Good => "Good for specific use cases",
            Self::Acceptable => "Acceptable but better exist",
            Self::Weak => "Difficult to recommend",
        }
    }

    /// Solid color matching the first stop of [`ScoreTier::gradient`].
    pub fn hex(&self) -> &'static str {
        match self {
            Self::Elite => "#f97316",
            Self::Excellent => "#6366f1",
            Self::Solid => "#3b82f6",
            Self::Good => "#22c55e",
            Self::Acceptable => "#eab308",
            Self::Weak => "#6b7280",
        }
    }
}
