use schemars::JsonSchema;
use serde::Deserialize;
use tracing_appender::rolling::Rotation;

/// How often a new log file is started
#[derive(Debug, Deserialize, JsonSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotationKind {
    #[serde(alias = "Minutely", alias = "MINUTELY")]
    Minutely,
    #[serde(alias = "Hourly", alias = "HOURLY")]
    Hourly,
    #[serde(alias = "Daily", alias = "DAILY")]
    Daily,
    #[serde(alias = "Never", alias = "NEVER")]
    Never,
}

impl From<LogRotationKind> for Rotation {
    fn from(value: LogRotationKind) -> Self {
        match value {
            LogRotationKind::Minutely => Rotation::MINUTELY,
            LogRotationKind::Hourly => Rotation::HOURLY,
            LogRotationKind::Daily => Rotation::DAILY,
            LogRotationKind::Never => Rotation::NEVER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LogRotationKind;
    use rstest::rstest;
    use tracing_appender::rolling::Rotation;

    #[rstest]
    #[case("\"minutely\"", Rotation::MINUTELY)]
    #[case("\"Hourly\"", Rotation::HOURLY)]
    #[case("\"DAILY\"", Rotation::DAILY)]
    #[case("\"never\"", Rotation::NEVER)]
    fn it_parses_any_case_into_a_rotation(#[case] raw: &str, #[case] expected: Rotation) {
        let kind: LogRotationKind = serde_json::from_str(raw).unwrap();
        let actual: Rotation = kind.into();
        assert_eq!(expected, actual);
    }
}
