pub struct Icons;

impl Icons {
    pub const CAMPUS: &str = "🏛️";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const LINK: &str = "🔗";
    pub const DATABASE: &str = "🗄️";
    pub const TABLE: &str = "📋";
    pub const SEARCH: &str = "🔍";
    pub const DEL: &str = "🗑️";
    pub const EMPTY: &str = "∅";
}
