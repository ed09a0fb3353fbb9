use crate::app::{RecordResult, RecordState, RecordType, RunSummary, TimelineRecord};
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10 MB

pub fn check_response_size(json: &str) -> Result<(), FetchError> {
    if json.len() > MAX_RESPONSE_SIZE {
        return Err(FetchError::Malformed(format!(
            "response too large ({:.1} MB, max {} MB)",
            json.len() as f64 / (1024.0 * 1024.0),
            MAX_RESPONSE_SIZE / (1024 * 1024)
        )));
    }
    Ok(())
}

// -- Intermediate Azure DevOps timeline structs --

#[derive(Deserialize, Debug)]
struct AzTimeline {
    #[serde(default)]
    records: Option<Vec<AzRecord>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AzRecord {
    id: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default, rename = "type")]
    record_type: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    order: Option<i64>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    finish_time: Option<String>,
    #[serde(default)]
    log: Option<AzLogRef>,
}

#[derive(Deserialize, Debug)]
struct AzLogRef {
    id: u64,
}

/// Timestamps carry 7 fractional digits; anything unparseable is treated as absent.
fn parse_time(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<AzRecord> for TimelineRecord {
    fn from(r: AzRecord) -> Self {
        TimelineRecord {
            id: r.id,
            parent_id: r.parent_id,
            record_type: r.record_type.as_deref().map(RecordType::from_wire),
            name: r.name.filter(|n| !n.is_empty()),
            order: r.order,
            state: r
                .state
                .as_deref()
                .map_or(RecordState::Unknown, RecordState::from_wire),
            result: r.result.as_deref().and_then(RecordResult::from_wire),
            start_time: parse_time(r.start_time.as_deref()),
            finish_time: parse_time(r.finish_time.as_deref()),
            log_id: r.log.map(|l| l.id),
        }
    }
}

/// `az devops invoke --resource timeline` output. A run that has not been scheduled
/// yet comes back with `records: null`, which parses to an empty timeline.
pub fn parse_timeline(json: &str) -> Result<Vec<TimelineRecord>, FetchError> {
    check_response_size(json)?;
    let timeline: AzTimeline = serde_json::from_str(json)?;
    Ok(timeline
        .records
        .unwrap_or_default()
        .into_iter()
        .map(TimelineRecord::from)
        .collect())
}

#[derive(Deserialize, Debug)]
struct AzLogLines {
    value: Vec<String>,
}

/// Log lines arrive as `{"count": n, "value": [...]}`; anything else is taken as raw text.
pub fn parse_log(output: &str) -> Result<String, FetchError> {
    check_response_size(output)?;
    match serde_json::from_str::<AzLogLines>(output) {
        Ok(lines) => Ok(lines.value.join("\n")),
        Err(_) => Ok(output.to_string()),
    }
}

// -- Intermediate Azure DevOps build (run) struct --

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AzRun {
    id: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    build_number: Option<String>,
    #[serde(default)]
    source_branch: Option<String>,
    #[serde(default)]
    definition: Option<AzDefinition>,
}

#[derive(Deserialize, Debug)]
struct AzDefinition {
    #[serde(default)]
    name: String,
}

impl From<AzRun> for RunSummary {
    fn from(r: AzRun) -> Self {
        let pipeline = r.definition.map(|d| d.name).unwrap_or_default();
        let title = match (pipeline.is_empty(), r.build_number) {
            (false, Some(number)) => format!("{pipeline} #{number}"),
            (true, Some(number)) => number,
            (false, None) => pipeline,
            (true, None) => format!("Run {}", r.id),
        };
        RunSummary {
            status: r.status.unwrap_or_default(),
            result: r.result.filter(|res| !res.is_empty() && res != "none"),
            title,
            branch: r
                .source_branch
                .map(|b| b.trim_start_matches("refs/heads/").to_string())
                .unwrap_or_default(),
        }
    }
}

/// `az pipelines runs show --id N`.
pub fn parse_run(json: &str) -> Result<RunSummary, FetchError> {
    check_response_size(json)?;
    let run: AzRun = serde_json::from_str(json)?;
    Ok(run.into())
}

/// `az pipelines runs list --top 1`: the newest run id, if any.
pub fn parse_latest_run_id(json: &str) -> Result<Option<u64>, FetchError> {
    check_response_size(json)?;
    let runs: Vec<AzRun> = serde_json::from_str(json)?;
    Ok(runs.first().map(|r| r.id))
}
