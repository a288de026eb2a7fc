use std::fmt;
use std::fmt::{Display, Formatter};

use chrono::Utc;
use uuid::Uuid;

const SUFFIX_LENGTH: usize = 8;

/// Consumer group identifier scoping a single broker session.
///
/// Every session generates its own id so that concurrent snapshot and stream sessions never
/// land in the same group and trigger a rebalance on each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(String);

impl GroupId {
    /// Generates `<prefix>-<unix millis>-<random suffix>`.
    pub fn generate(prefix: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let millis = Utc::now().timestamp_millis();

        GroupId(format!("{prefix}-{millis}-{}", &suffix[..SUFFIX_LENGTH]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GroupId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
