use crate::error::{AppError, AppResult};
use chrono::NaiveDateTime;
use serde::Serialize;

/// A single track point extracted from a GPX file.
#[derive(Debug, Clone)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub time: Option<NaiveDateTime>,
}

/// Computed statistics for one track segment.
#[derive(Debug, Clone, Default)]
pub struct SegmentStats {
    pub duration_seconds: i64,
    pub pauses_seconds: i64,
    pub moving_seconds: i64,
    pub distance_km: f64,
    pub min_alt: Option<f64>,
    pub max_alt: Option<f64>,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    pub max_speed: Option<f64>,
    pub ave_speed: Option<f64>,
}

/// Aggregated statistics for a whole GPX track.
#[derive(Debug, Clone, Default)]
pub struct GpxStats {
    pub duration_seconds: i64,
    pub pauses_seconds: i64,
    pub moving_seconds: i64,
    pub distance_km: f64,
    pub min_alt: Option<f64>,
    pub max_alt: Option<f64>,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    pub max_speed: Option<f64>,
    pub ave_speed: Option<f64>,
}

#[derive(Debug)]
pub struct GpxData {
    pub name: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    /// [min_lat, min_lon, max_lat, max_lon]
    pub bounds: Option<[f64; 4]>,
    pub stats: GpxStats,
    pub segments: Vec<SegmentStats>,
}

/// One entry of the chart series served to clients.
#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub distance: f64,
    pub duration: i64,
    pub elevation: Option<f64>,
    pub speed: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Haversine distance in km between two lat/lon points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const R: f64 = 6371.0; // Earth radius in km
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    R * c
}

/// Parse a GPX document into raw track segments.
///
/// Only `<trk>/<trkseg>/<trkpt>` content is read; routes and standalone
/// waypoints are ignored. Empty segments are dropped.
pub fn parse_gpx(content: &str) -> AppResult<(Option<String>, Vec<Vec<GpxPoint>>)> {
    let doc = roxmltree::Document::parse(content)
        .map_err(|e| AppError::Validation(format!("Invalid gpx file: {}", e)))?;

    let root = doc.root_element();
    if root.tag_name().name() != "gpx" {
        return Err(AppError::Validation("Invalid gpx file: not a gpx document".to_string()));
    }

    let mut name = None;
    let mut segments: Vec<Vec<GpxPoint>> = Vec::new();

    for trk in root.children().filter(|n| n.tag_name().name() == "trk") {
        if name.is_none() {
            name = trk
                .children()
                .find(|n| n.tag_name().name() == "name")
                .and_then(|n| n.text())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
        }

        for trkseg in trk.children().filter(|n| n.tag_name().name() == "trkseg") {
            let mut points = Vec::new();
            for trkpt in trkseg.children().filter(|n| n.tag_name().name() == "trkpt") {
                let lat: f64 = trkpt
                    .attribute("lat")
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| {
                        AppError::Validation("Invalid gpx file: track point without latitude".to_string())
                    })?;
                let lon: f64 = trkpt
                    .attribute("lon")
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| {
                        AppError::Validation("Invalid gpx file: track point without longitude".to_string())
                    })?;

                let elevation = trkpt
                    .children()
                    .find(|n| n.tag_name().name() == "ele")
                    .and_then(|n| n.text())
                    .and_then(|v| v.trim().parse().ok());

                let time = trkpt
                    .children()
                    .find(|n| n.tag_name().name() == "time")
                    .and_then(|n| n.text())
                    .and_then(parse_gpx_time);

                points.push(GpxPoint {
                    lat,
                    lon,
                    elevation,
                    time,
                });
            }
            if !points.is_empty() {
                segments.push(points);
            }
        }
    }

    if segments.is_empty() {
        return Err(AppError::Validation(
            "Invalid gpx file: no tracks or no track points".to_string(),
        ));
    }

    Ok((name, segments))
}

fn parse_gpx_time(raw: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.naive_utc())
        .ok()
}

/// Parse a GPX document and compute workout statistics.
///
/// `stopped_speed_threshold` (km/h) comes from the workout's sport: points
/// slower than the threshold do not count as moving time.
pub fn process_gpx(content: &str, stopped_speed_threshold: f64) -> AppResult<GpxData> {
    let (name, segments) = parse_gpx(content)?;

    let segment_stats: Vec<SegmentStats> = segments
        .iter()
        .map(|points| compute_segment_stats(points, stopped_speed_threshold))
        .collect();

    let start_time = segments.first().and_then(|s| s.first()).and_then(|p| p.time);
    let end_time = segments.last().and_then(|s| s.last()).and_then(|p| p.time);

    // Whole-track duration spans the gaps between segments; the difference
    // with summed moving time is reported as pauses.
    let duration_seconds = match (start_time, end_time) {
        (Some(start), Some(end)) => (end - start).num_seconds().max(0),
        _ => 0,
    };
    let moving_seconds: i64 = segment_stats.iter().map(|s| s.moving_seconds).sum();
    let pauses_seconds = (duration_seconds - moving_seconds).max(0);

    let distance_km: f64 = segment_stats.iter().map(|s| s.distance_km).sum();
    let min_alt = segment_stats.iter().filter_map(|s| s.min_alt).fold(None, fold_min);
    let max_alt = segment_stats.iter().filter_map(|s| s.max_alt).fold(None, fold_max);
    let ascent = sum_options(segment_stats.iter().map(|s| s.ascent));
    let descent = sum_options(segment_stats.iter().map(|s| s.descent));
    let max_speed = segment_stats.iter().filter_map(|s| s.max_speed).fold(None, fold_max);
    let ave_speed = if moving_seconds > 0 {
        Some(distance_km / (moving_seconds as f64 / 3600.0))
    } else {
        None
    };

    let bounds = compute_bounds(&segments);

    Ok(GpxData {
        name,
        start_time,
        bounds,
        stats: GpxStats {
            duration_seconds,
            pauses_seconds,
            moving_seconds,
            distance_km,
            min_alt,
            max_alt,
            ascent,
            descent,
            max_speed,
            ave_speed,
        },
        segments: segment_stats,
    })
}

fn fold_min(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(match acc {
        Some(a) => a.min(v),
        None => v,
    })
}

fn fold_max(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(match acc {
        Some(a) => a.max(v),
        None => v,
    })
}

fn sum_options(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let mut total = None;
    for v in values.flatten() {
        total = Some(total.unwrap_or(0.0) + v);
    }
    total
}

fn compute_bounds(segments: &[Vec<GpxPoint>]) -> Option<[f64; 4]> {
    let mut bounds: Option<[f64; 4]> = None;
    for point in segments.iter().flatten() {
        bounds = Some(match bounds {
            None => [point.lat, point.lon, point.lat, point.lon],
            Some([min_lat, min_lon, max_lat, max_lon]) => [
                min_lat.min(point.lat),
                min_lon.min(point.lon),
                max_lat.max(point.lat),
                max_lon.max(point.lon),
            ],
        });
    }
    bounds
}

fn compute_segment_stats(points: &[GpxPoint], stopped_speed_threshold: f64) -> SegmentStats {
    let mut stats = SegmentStats::default();

    let first_time = points.first().and_then(|p| p.time);
    let last_time = points.last().and_then(|p| p.time);
    if let (Some(start), Some(end)) = (first_time, last_time) {
        stats.duration_seconds = (end - start).num_seconds().max(0);
    }

    let mut prev_elevation: Option<f64> = None;
    for point in points {
        if let Some(ele) = point.elevation {
            stats.min_alt = fold_min(stats.min_alt, ele);
            stats.max_alt = fold_max(stats.max_alt, ele);
            if let Some(prev) = prev_elevation {
                let delta = ele - prev;
                if delta > 0.0 {
                    stats.ascent = Some(stats.ascent.unwrap_or(0.0) + delta);
                } else if delta < 0.0 {
                    stats.descent = Some(stats.descent.unwrap_or(0.0) - delta);
                }
            }
            prev_elevation = Some(ele);
        }
    }

    for pair in points.windows(2) {
        let dist = haversine_km(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon);
        stats.distance_km += dist;

        if let (Some(t0), Some(t1)) = (pair[0].time, pair[1].time) {
            let dt = (t1 - t0).num_seconds();
            if dt > 0 {
                let speed = dist / (dt as f64 / 3600.0);
                if speed >= stopped_speed_threshold {
                    stats.moving_seconds += dt;
                }
                stats.max_speed = fold_max(stats.max_speed, speed);
            }
        }
    }

    if stats.moving_seconds > 0 {
        stats.ave_speed = Some(stats.distance_km / (stats.moving_seconds as f64 / 3600.0));
    }
    stats.pauses_seconds = (stats.duration_seconds - stats.moving_seconds).max(0);

    stats
}

/// Build the per-point chart series for a GPX document.
pub fn chart_data(content: &str) -> AppResult<Vec<ChartPoint>> {
    let (_, segments) = parse_gpx(content)?;

    let start_time = segments.first().and_then(|s| s.first()).and_then(|p| p.time);
    let mut chart = Vec::new();
    let mut distance = 0.0;
    let mut prev: Option<&GpxPoint> = None;

    for point in segments.iter().flatten() {
        let mut speed = None;
        if let Some(prev) = prev {
            let dist = haversine_km(prev.lat, prev.lon, point.lat, point.lon);
            distance += dist;
            if let (Some(t0), Some(t1)) = (prev.time, point.time) {
                let dt = (t1 - t0).num_seconds();
                if dt > 0 {
                    speed = Some(round2(dist / (dt as f64 / 3600.0)));
                }
            }
        }

        let duration = match (start_time, point.time) {
            (Some(start), Some(t)) => (t - start).num_seconds().max(0),
            _ => 0,
        };

        chart.push(ChartPoint {
            distance: round3(distance),
            duration,
            elevation: point.elevation,
            speed,
            latitude: point.lat,
            longitude: point.lon,
        });
        prev = Some(point);
    }

    Ok(chart)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
