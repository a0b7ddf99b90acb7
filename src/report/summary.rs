use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use jiff::tz::TimeZone;
use jiff::Timestamp;

use crate::registry::Record;

/// An interval spent listening on one device at one volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub start: i64,
    pub end: i64,
    pub volume: f64,
}

impl Span {
    fn secs(&self) -> i64 {
        self.end - self.start
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceSummary {
    pub device: String,
    pub avg_volume: f64,
    pub share_percent: u32,
    pub total_secs: i64,
    pub loud_secs: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HourSummary {
    pub hour: u8,
    pub avg_volume_percent: u32,
    pub device: &'static str,
}

/// Replays records inside `[start, end]` and attributes the time between
/// consecutive records to the active port, at the loudest live stream volume.
pub fn device_spans<I>(records: I, start: i64, end: i64) -> BTreeMap<String, Vec<Span>>
where
    I: IntoIterator<Item = Record>,
{
    let mut spans: BTreeMap<String, Vec<Span>> = BTreeMap::new();
    let mut streams: HashMap<u32, f64> = HashMap::new();
    let mut device = String::new();
    let mut prev: Option<i64> = None;

    for record in records {
        let ts = record.epoch_seconds;
        if ts < start {
            continue;
        }
        if ts > end {
            break;
        }
        let since = prev.unwrap_or(ts);

        let loudest = streams.values().copied().fold(0.0, f64::max);
        if loudest > 0.0 {
            spans.entry(device.clone()).or_default().push(Span { start: since, end: ts, volume: loudest });
        }
        if record.active_port != device {
            device = record.active_port.clone();
        }

        if record.raw_volume < 0.0 {
            streams.remove(&record.index);
        } else {
            streams.insert(record.index, record.effective_volume);
        }
        prev = Some(ts);
    }

    spans.remove("");
    spans
}

pub fn summarize(spans: &BTreeMap<String, Vec<Span>>) -> Vec<DeviceSummary> {
    let mut summaries: Vec<DeviceSummary> = spans
        .iter()
        .map(|(device, spans)| {
            let total_secs: i64 = spans.iter().map(Span::secs).sum();
            let weighted: f64 = spans.iter().map(|s| s.secs() as f64 * s.volume).sum();
            let avg_volume = if total_secs > 0 { weighted / total_secs as f64 } else { 0.0 };
            let loud_secs = spans.iter().filter(|s| s.volume > avg_volume).map(Span::secs).sum();
            DeviceSummary { device: device.clone(), avg_volume, share_percent: 0, total_secs, loud_secs }
        })
        .collect();

    let listening: i64 = summaries.iter().map(|s| s.total_secs).sum();
    if listening > 0 {
        for summary in &mut summaries {
            summary.share_percent = (summary.total_secs as f64 * 100.0 / listening as f64).round() as u32;
        }
    }
    summaries
}

/// Average volume and dominant device for each local hour of the day.
pub fn hourly(spans: &BTreeMap<String, Vec<Span>>, tz: &TimeZone) -> Result<Vec<HourSummary>, jiff::Error> {
    let mut volume = [0.0f64; 24];
    let mut samples = [0u32; 24];
    let mut speaker = [0i64; 24];
    let mut headphone = [0i64; 24];

    for (device, spans) in spans {
        for span in spans {
            let mut cur = span.start;
            while cur < span.end {
                let secs = (span.end - cur).min(3600);
                let hour = Timestamp::from_second(cur)?.to_zoned(tz.clone()).hour() as usize;
                if device.contains("speaker") {
                    speaker[hour] += secs;
                } else if device.contains("headphone") {
                    headphone[hour] += secs;
                }
                volume[hour] += span.volume;
                samples[hour] += 1;
                cur += 3600;
            }
        }
    }

    Ok((0..24)
        .map(|h| HourSummary {
            hour: h as u8,
            avg_volume_percent: if samples[h] > 0 {
                (volume[h] * 100.0 / samples[h] as f64).round() as u32
            } else {
                0
            },
            device: if headphone[h] < speaker[h] { "Speakers" } else { "Headphones" },
        })
        .collect())
}

pub fn human_duration(secs: i64) -> String {
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    if h != 0 {
        format!("{} hrs {} min", h, m)
    } else if m != 0 {
        format!("{} min", m)
    } else {
        format!("{} sec", s)
    }
}

pub fn render(summaries: &[DeviceSummary], hours: &[HourSummary]) -> String {
    let mut out = String::new();
    for s in summaries {
        let title = if s.device.contains("speaker") {
            "Laptop speaker"
        } else if s.device.contains("headphone") {
            "Headphones"
        } else {
            s.device.as_str()
        };
        let _ = writeln!(out, "{} :", title);
        let _ = writeln!(out, "{}", "-".repeat(title.len() + 2));
        let _ = writeln!(out, "Used {} % time.", s.share_percent);
        let _ = writeln!(out, "Average volume : {} %", (s.avg_volume * 100.0).round());
        let _ = writeln!(out, "Total time : {}", human_duration(s.total_secs));
        let _ = writeln!(out, "Loud for : {}", human_duration(s.loud_secs));
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Hour wise usage :");
    let _ = writeln!(out, "------------------");
    let _ = writeln!(out, " Hour | Average vol | Mostly listen on");
    let _ = writeln!(out, "------|-------------|------------------");
    for h in hours.iter().filter(|h| h.avg_volume_percent != 0) {
        let _ = writeln!(out, "  {:2}  |     {:2} %    | {}", h.hour, h.avg_volume_percent, h.device);
    }
    let _ = writeln!(out, "---------------------------------------");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ts: i64, index: u32, port: &str, effective: f64) -> Record {
        Record {
            epoch_seconds: ts,
            index,
            active_port: port.to_string(),
            raw_volume: effective,
            effective_volume: effective,
        }
    }

    fn listening_session() -> Vec<Record> {
        vec![
            rec(0, 1, "analog-output-speaker", 0.5),
            rec(600, 1, "analog-output-speaker", 1.0),
            rec(900, 1, "analog-output-headphones", 1.0),
            rec(1200, 1, "analog-output-headphones", -1.0),
            rec(1800, 2, "analog-output-headphones", 0.2),
        ]
    }

    #[test]
    fn test_device_spans() {
        let spans = device_spans(listening_session(), 0, i64::MAX);

        assert_eq!(
            spans["analog-output-speaker"],
            vec![Span { start: 0, end: 600, volume: 0.5 }, Span { start: 600, end: 900, volume: 1.0 }]
        );
        // The stream was removed at 1200, so nothing is attributed after it.
        assert_eq!(spans["analog-output-headphones"], vec![Span { start: 900, end: 1200, volume: 1.0 }]);
    }

    #[test]
    fn test_device_spans_window() {
        let spans = device_spans(listening_session(), 600, 1000);
        assert_eq!(spans["analog-output-speaker"], vec![Span { start: 600, end: 900, volume: 1.0 }]);
        assert!(!spans.contains_key("analog-output-headphones"));
    }

    #[test]
    fn test_removal_under_silent_output() {
        // Removed while the active output sat at zero volume: effective reads -0.
        let removed = Record {
            epoch_seconds: 600,
            index: 1,
            active_port: "analog-output-speaker".to_string(),
            raw_volume: -1.0,
            effective_volume: -0.0,
        };
        let records = vec![
            rec(0, 1, "analog-output-speaker", 0.5),
            removed,
            rec(1200, 2, "analog-output-speaker", 0.0),
            rec(1800, 2, "analog-output-speaker", 0.0),
        ];

        let spans = device_spans(records, 0, i64::MAX);
        assert_eq!(spans["analog-output-speaker"], vec![Span { start: 0, end: 600, volume: 0.5 }]);
    }

    #[test]
    fn test_summarize() {
        let spans = device_spans(listening_session(), 0, i64::MAX);
        let summaries = summarize(&spans);

        let headphones = &summaries[0];
        assert_eq!(headphones.device, "analog-output-headphones");
        assert_eq!(headphones.total_secs, 300);
        assert_eq!(headphones.share_percent, 25);

        let speaker = &summaries[1];
        assert_eq!(speaker.total_secs, 900);
        assert_eq!(speaker.share_percent, 75);
        assert!((speaker.avg_volume - (600.0 * 0.5 + 300.0 * 1.0) / 900.0).abs() < 1e-9);
        assert_eq!(speaker.loud_secs, 300);
    }

    #[test]
    fn test_hourly() {
        let mut spans = BTreeMap::new();
        spans.insert(
            "analog-output-speaker".to_string(),
            vec![Span { start: 0, end: 5400, volume: 0.5 }],
        );
        spans.insert(
            "analog-output-headphones".to_string(),
            vec![Span { start: 3 * 3600, end: 3 * 3600 + 60, volume: 0.8 }],
        );

        let hours = hourly(&spans, &TimeZone::UTC).unwrap();
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[0], HourSummary { hour: 0, avg_volume_percent: 50, device: "Speakers" });
        assert_eq!(hours[1].avg_volume_percent, 50);
        assert_eq!(hours[3], HourSummary { hour: 3, avg_volume_percent: 80, device: "Headphones" });
        assert_eq!(hours[5].avg_volume_percent, 0);
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(42), "42 sec");
        assert_eq!(human_duration(600), "10 min");
        assert_eq!(human_duration(3 * 3600 + 5 * 60 + 9), "3 hrs 5 min");
    }

    #[test]
    fn test_render() {
        let spans = device_spans(listening_session(), 0, i64::MAX);
        let text = render(&summarize(&spans), &hourly(&spans, &TimeZone::UTC).unwrap());
        assert!(text.contains("Laptop speaker :"));
        assert!(text.contains("Headphones :"));
        assert!(text.contains("Used 75 % time."));
        assert!(text.contains("Hour wise usage :"));
    }
}
