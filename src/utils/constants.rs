// src/utils/constants.rs

/// Minimum token length kept when vectorizing complaint text.
pub const MIN_TOKEN_LENGTH: usize = 2;

/// Display-facing inefficiency policy: a job is only charged with
/// efficiency loss once its deviation exceeds this fraction of the
/// expected hours for its complaint type.
pub const DISPLAY_EFFICIENCY_MARGIN: f64 = 0.2;

/// Percentile of per-complaint labor hours used as the "efficient"
/// benchmark in the financial model (stricter than the mean).
pub const EFFICIENT_BENCHMARK_QUANTILE: f64 = 0.25;

/// Deviation percentage above which a job counts toward efficiency risk.
pub const EFFICIENCY_RISK_PCT: f64 = 20.0;

/// Deviation percentage treated as a strong misdiagnosis indicator.
pub const HIGH_DEVIATION_PCT: f64 = 50.0;

/// Complaint-similarity score above which a job counts toward the
/// misdiagnosis composite.
pub const SIMILARITY_RISK_THRESHOLD: f64 = 0.7;

/// Vehicle-complexity scores above this batch quantile count as a risk
/// indicator.
pub const COMPLEXITY_RISK_QUANTILE: f64 = 0.8;

/// Number of independent 0/1 risk indicators required to mark a job
/// high-risk.
pub const HIGH_RISK_MIN_FACTORS: i32 = 2;

// Misdiagnosis composite weights. Must sum to 1.0; see
// scoring::risk tests.
pub const REPEAT_WEIGHT: f64 = 0.4;
pub const EFFICIENCY_WEIGHT: f64 = 0.3;
pub const RISK_WEIGHT: f64 = 0.2;
pub const SIMILARITY_WEIGHT: f64 = 0.1;

/// Complaint sample count at which the complaint-side confidence reaches 1.0.
pub const COMPLAINT_FULL_CONFIDENCE_SAMPLES: f64 = 10.0;

/// Technician job count at which the technician-side confidence reaches 1.0.
pub const TECH_FULL_CONFIDENCE_JOBS: f64 = 20.0;

/// Parts cost is capped at this multiple of labor cost to suppress outliers.
pub const MAX_PARTS_TO_LABOR_RATIO: f64 = 5.0;

/// Fraction of estimated parts cost written off on comeback or
/// significantly inefficient jobs.
pub const PARTS_WASTE_FACTOR: f64 = 0.10;

/// Rework cost as a fraction of the original labor cost.
pub const REWORK_COST_RATIO: f64 = 0.30;

/// Probability of losing a customer after a comeback visit.
pub const RETENTION_RISK_FACTOR: f64 = 0.05;

// Industry-standard customer lifetime assumptions, used instead of
// batch-derived visit counts which are unreliable for small datasets.
pub const INDUSTRY_VISITS_PER_YEAR: f64 = 2.5;
pub const INDUSTRY_CUSTOMER_LIFESPAN_YEARS: f64 = 3.0;

/// Industry benchmark comeback rate used in the savings analysis.
pub const INDUSTRY_BENCHMARK_COMEBACK_RATE: f64 = 0.05;

/// Data confidence above which a job participates in the conservative
/// savings estimate.
pub const SAVINGS_CONFIDENCE_FLOOR: f64 = 0.7;

/// Fraction of high-confidence losses assumed recoverable through process
/// improvements.
pub const SAVINGS_IMPROVEMENT_RATE: f64 = 0.6;

/// Rows per INSERT statement when writing the transformed set.
pub const DB_INSERT_BATCH_SIZE: usize = 500;

/// English stopwords removed before TF-IDF vectorization of complaint text.
pub const STOPWORDS: [&str; 121] = [
    "a", "an", "the", "and", "or", "but", "nor", "for", "yet", "so", "in", "on", "at", "by",
    "to", "with", "from", "of", "as", "into", "about", "before", "after", "during", "until",
    "since", "unless", "is", "am", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "will", "would", "shall", "should", "may",
    "might", "must", "can", "could", "it", "its", "this", "that", "these", "those", "they",
    "them", "their", "there", "here", "where", "when", "while", "what", "which", "who", "whom",
    "how", "why", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such",
    "no", "not", "only", "own", "same", "than", "too", "very", "just", "also", "then", "once",
    "again", "further", "out", "off", "over", "under", "up", "down", "above", "below", "between",
    "through", "against", "because", "if", "my", "your", "his", "her", "our", "we", "you", "he",
    "she", "i", "me", "him",
];
