use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::storage::SubmissionRecord;

pub const HIGHLIGHT_COUNT: usize = 3;
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total: usize,
    pub last_24h: usize,
    pub average_rating: Option<f64>,
    /// Mean rating minus the neutral rating of 3.
    pub average_delta: Option<f64>,
    pub median_rating: Option<f64>,
    pub positive_count: usize,
    pub positive_pct: f64,
    pub critical_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: usize,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub count: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub rating: u8,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub metrics: Metrics,
    pub distribution: Vec<RatingBucket>,
    pub timeline: Vec<DailyPoint>,
    pub critical_highlights: Vec<Highlight>,
    pub top_highlights: Vec<Highlight>,
}

pub fn overview(records: &[SubmissionRecord], now: NaiveDateTime) -> Overview {
    Overview {
        metrics: metrics(records, now),
        distribution: distribution(records),
        timeline: timeline(records),
        critical_highlights: highlights(records, |r| r.is_critical()),
        top_highlights: highlights(records, |r| r.rating == 5),
    }
}

pub fn metrics(records: &[SubmissionRecord], now: NaiveDateTime) -> Metrics {
    let total = records.len();
    let positive_count = records.iter().filter(|r| r.is_positive()).count();
    let critical_count = records.iter().filter(|r| r.is_critical()).count();
    let last_24h = records
        .iter()
        .filter(|r| r.timestamp > now - Duration::days(1))
        .count();

    let average_rating = mean(records.iter().map(|r| r.rating));
    let positive_pct = if total == 0 {
        0.0
    } else {
        positive_count as f64 * 100.0 / total as f64
    };

    Metrics {
        total,
        last_24h,
        average_rating,
        average_delta: average_rating.map(|avg| avg - 3.0),
        median_rating: median(records.iter().map(|r| r.rating).collect()),
        positive_count,
        positive_pct,
        critical_count,
    }
}

/// Count and share for every star value, including empty ones.
pub fn distribution(records: &[SubmissionRecord]) -> Vec<RatingBucket> {
    let total = records.len();
    (1..=5u8)
        .map(|rating| {
            let count = records.iter().filter(|r| r.rating == rating).count();
            let share_pct = if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            };
            RatingBucket {
                rating,
                count,
                share_pct,
            }
        })
        .collect()
}

pub fn timeline(records: &[SubmissionRecord]) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, Vec<u8>> = BTreeMap::new();
    for record in records {
        by_date
            .entry(record.timestamp.date())
            .or_default()
            .push(record.rating);
    }

    by_date
        .into_iter()
        .map(|(date, ratings)| DailyPoint {
            date,
            count: ratings.len(),
            average_rating: mean(ratings.into_iter()).unwrap_or_default(),
        })
        .collect()
}

fn highlights(records: &[SubmissionRecord], keep: impl Fn(&SubmissionRecord) -> bool) -> Vec<Highlight> {
    records
        .iter()
        .filter(|r| keep(*r))
        .take(HIGHLIGHT_COUNT)
        .map(|r| Highlight {
            rating: r.rating,
            summary: r.ai_summary.clone(),
        })
        .collect()
}

fn mean(ratings: impl Iterator<Item = u8>) -> Option<f64> {
    let (sum, count) = ratings.fold((0u64, 0u64), |(sum, count), r| (sum + r as u64, count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

fn median(mut ratings: Vec<u8>) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    ratings.sort_unstable();
    let mid = ratings.len() / 2;
    Some(if ratings.len() % 2 == 0 {
        (ratings[mid - 1] as f64 + ratings[mid] as f64) / 2.0
    } else {
        ratings[mid] as f64
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
}

impl DateRange {
    pub const ALL: [DateRange; 4] = [
        DateRange::All,
        DateRange::Today,
        DateRange::Last7Days,
        DateRange::Last30Days,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DateRange::All => "all",
            DateRange::Today => "today",
            DateRange::Last7Days => "last_7_days",
            DateRange::Last30Days => "last_30_days",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateRange::All => "All Time",
            DateRange::Today => "Today",
            DateRange::Last7Days => "Last 7 Days",
            DateRange::Last30Days => "Last 30 Days",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|range| range.as_str() == value)
    }

    pub fn contains(self, timestamp: NaiveDateTime, now: NaiveDateTime) -> bool {
        match self {
            DateRange::All => true,
            DateRange::Today => timestamp.date() == now.date(),
            DateRange::Last7Days => timestamp > now - Duration::days(7),
            DateRange::Last30Days => timestamp > now - Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    HighestRating,
    LowestRating,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::NewestFirst,
        SortOrder::OldestFirst,
        SortOrder::HighestRating,
        SortOrder::LowestRating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "newest_first",
            SortOrder::OldestFirst => "oldest_first",
            SortOrder::HighestRating => "highest_rating",
            SortOrder::LowestRating => "lowest_rating",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "Newest First",
            SortOrder::OldestFirst => "Oldest First",
            SortOrder::HighestRating => "Highest Rating",
            SortOrder::LowestRating => "Lowest Rating",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|order| order.as_str() == value)
    }
}

/// Rating subset, date window and ordering applied to the loaded records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFilter {
    pub ratings: [bool; 5],
    pub date_range: DateRange,
    pub sort: SortOrder,
}

impl Default for ReviewFilter {
    fn default() -> Self {
        Self {
            ratings: [true; 5],
            date_range: DateRange::All,
            sort: SortOrder::NewestFirst,
        }
    }
}

impl ReviewFilter {
    /// Builds a filter from decoded query pairs: `rating` (repeatable), `date`, `sort`.
    ///
    /// Without any `rating` key every rating is selected, unless `applied` is
    /// present, which marks a submitted form where no box was ticked.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut filter = Self::default();
        let mut picked = [false; 5];
        let mut explicit = false;

        for (key, value) in pairs {
            match key.as_str() {
                "rating" => {
                    explicit = true;
                    if let Ok(rating @ 1..=5) = value.trim().parse::<u8>() {
                        picked[rating as usize - 1] = true;
                    }
                }
                "applied" => explicit = true,
                "date" => filter.date_range = DateRange::parse(value).unwrap_or_default(),
                "sort" => filter.sort = SortOrder::parse(value).unwrap_or_default(),
                _ => {}
            }
        }

        if explicit {
            filter.ratings = picked;
        }
        filter
    }

    pub fn to_query(&self) -> String {
        let mut parts = vec!["applied=1".to_string()];
        parts.extend(
            (1..=5u8)
                .filter(|r| self.includes_rating(*r))
                .map(|r| format!("rating={}", r)),
        );
        parts.push(format!("date={}", self.date_range.as_str()));
        parts.push(format!("sort={}", self.sort.as_str()));
        parts.join("&")
    }

    pub fn includes_rating(&self, rating: u8) -> bool {
        (1..=5).contains(&rating) && self.ratings[rating as usize - 1]
    }

    pub fn apply<'a>(&self, records: &'a [SubmissionRecord], now: NaiveDateTime) -> Vec<&'a SubmissionRecord> {
        let mut selected: Vec<&SubmissionRecord> = records
            .iter()
            .filter(|r| self.includes_rating(r.rating))
            .filter(|r| self.date_range.contains(r.timestamp, now))
            .collect();

        match self.sort {
            SortOrder::NewestFirst => selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortOrder::OldestFirst => selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::HighestRating => selected.sort_by(|a, b| b.rating.cmp(&a.rating)),
            SortOrder::LowestRating => selected.sort_by(|a, b| a.rating.cmp(&b.rating)),
        }
        selected
    }
}

pub fn critical_only<'a>(records: &[&'a SubmissionRecord]) -> Vec<&'a SubmissionRecord> {
    records.iter().copied().filter(|r| r.is_critical()).collect()
}

/// The 1-based `page` value among decoded query pairs.
pub fn page_from_pairs(pairs: &[(String, String)]) -> usize {
    pairs
        .iter()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

/// Slices one page out of `items`, clamping `page` into range.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let total = items.len();
    let pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);

    Page {
        items: items[start.min(total)..end].to_vec(),
        page,
        pages,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::Uri};
    use chrono::NaiveDate;

    fn pairs(query: &str) -> Vec<(String, String)> {
        let uri: Uri = format!("/admin?{}", query).parse().unwrap();
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri).unwrap();
        pairs
    }

    fn parse_filter(query: &str) -> ReviewFilter {
        ReviewFilter::from_pairs(&pairs(query))
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn record(rating: u8, timestamp: NaiveDateTime, summary: &str) -> SubmissionRecord {
        SubmissionRecord {
            timestamp,
            rating,
            review_text: format!("{} stars", rating),
            ai_response: "Thanks".to_string(),
            ai_summary: summary.to_string(),
            recommended_actions: "None".to_string(),
        }
    }

    fn sample() -> Vec<SubmissionRecord> {
        vec![
            record(5, at(1, 9), "loved it"),
            record(1, at(2, 9), "cold food"),
            record(4, at(2, 12), "nice staff"),
            record(2, at(20, 9), "slow service"),
            record(5, at(20, 18), "great value"),
        ]
    }

    #[test]
    fn metrics_over_sample() {
        let m = metrics(&sample(), at(20, 20));
        assert_eq!(m.total, 5);
        assert_eq!(m.last_24h, 2);
        assert_eq!(m.average_rating, Some(3.4));
        assert_eq!(m.median_rating, Some(4.0));
        assert_eq!(m.positive_count, 3);
        assert!((m.positive_pct - 60.0).abs() < f64::EPSILON);
        assert_eq!(m.critical_count, 2);
    }

    #[test]
    fn metrics_of_empty_store() {
        let m = metrics(&[], at(1, 0));
        assert_eq!(m.total, 0);
        assert_eq!(m.average_rating, None);
        assert_eq!(m.median_rating, None);
        assert_eq!(m.positive_pct, 0.0);
    }

    #[test]
    fn positive_share_rises_after_five_star() {
        let mut records = sample();
        let before = metrics(&records, at(21, 0)).positive_pct;
        records.push(record(5, at(21, 0), "loved it"));
        assert!(metrics(&records, at(21, 0)).positive_pct > before);
    }

    #[test]
    fn distribution_covers_all_ratings() {
        let buckets = distribution(&sample());
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 1, 2]);
        assert_eq!(buckets[4].share_pct, 40.0);
    }

    #[test]
    fn timeline_groups_by_date() {
        let points = timeline(&sample());
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(points[1].count, 2);
        assert_eq!(points[1].average_rating, 2.5);
    }

    #[test]
    fn highlights_keep_insertion_order() {
        let o = overview(&sample(), at(21, 0));
        let critical: Vec<&str> = o.critical_highlights.iter().map(|h| h.summary.as_str()).collect();
        assert_eq!(critical, vec!["cold food", "slow service"]);
        let top: Vec<&str> = o.top_highlights.iter().map(|h| h.summary.as_str()).collect();
        assert_eq!(top, vec!["loved it", "great value"]);
    }

    #[test]
    fn filter_by_rating_and_date() {
        let records = sample();
        let now = at(20, 20);

        let filter = parse_filter("rating=4&rating=5&date=last_7_days");
        let selected = filter.apply(&records, now);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].ai_summary, "great value");

        let today = parse_filter("date=today");
        assert_eq!(today.apply(&records, now).len(), 2);

        let month = parse_filter("date=last_30_days");
        assert_eq!(month.apply(&records, now).len(), 5);

        let none = parse_filter("applied=1&date=all");
        assert!(none.apply(&records, now).is_empty());
    }

    #[test]
    fn sort_orders() {
        let records = sample();
        let now = at(21, 0);
        let summaries = |query: &str| -> Vec<String> {
            parse_filter(query)
                .apply(&records, now)
                .iter()
                .map(|r| r.ai_summary.clone())
                .collect()
        };

        assert_eq!(summaries("")[0], "great value");
        assert_eq!(summaries("sort=oldest_first")[0], "loved it");
        assert_eq!(
            summaries("sort=highest_rating"),
            vec!["loved it", "great value", "nice staff", "slow service", "cold food"]
        );
        assert_eq!(summaries("sort=lowest_rating")[0], "cold food");
    }

    #[test]
    fn percent_encoded_values_are_decoded() {
        let filter = parse_filter("applied=1&rating=%35&date=last%5F7%5Fdays&sort=lowest%5Frating");
        assert_eq!(filter.ratings, [false, false, false, false, true]);
        assert_eq!(filter.date_range, DateRange::Last7Days);
        assert_eq!(filter.sort, SortOrder::LowestRating);

        let spaced = parse_filter("rating=+4+&date=today");
        assert!(spaced.includes_rating(4));
        assert_eq!(spaced.date_range, DateRange::Today);
    }

    #[test]
    fn unknown_values_fall_back_to_defaults() {
        let filter = parse_filter("date=yesterday&sort=random&rating=9");
        assert_eq!(filter.date_range, DateRange::All);
        assert_eq!(filter.sort, SortOrder::NewestFirst);
        assert_eq!(filter.ratings, [false; 5]);
    }

    #[test]
    fn query_round_trips_through_links() {
        let filter = parse_filter("rating=1&rating=3&date=today&sort=lowest_rating");
        assert_eq!(
            filter.to_query(),
            "applied=1&rating=1&rating=3&date=today&sort=lowest_rating"
        );
        assert_eq!(parse_filter(&filter.to_query()), filter);
    }

    #[test]
    fn critical_subset_of_filtered() {
        let records = sample();
        let filtered = ReviewFilter::default().apply(&records, at(21, 0));
        let critical = critical_only(&filtered);
        assert_eq!(critical.len(), 2);
        assert!(critical.iter().all(|r| r.rating <= 2));
    }

    #[test]
    fn pagination_clamps() {
        let items: Vec<u32> = (0..45).collect();
        let first = paginate(&items, 1, PAGE_SIZE);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.pages, 3);

        let last = paginate(&items, 99, PAGE_SIZE);
        assert_eq!(last.page, 3);
        assert_eq!(last.items, vec![40, 41, 42, 43, 44]);

        let empty = paginate::<u32>(&[], 2, PAGE_SIZE);
        assert_eq!(empty.page, 1);
        assert!(empty.items.is_empty());
        assert_eq!(page_from_pairs(&pairs("sort=oldest_first&page=2")), 2);
        assert_eq!(page_from_pairs(&pairs("page=0")), 1);
        assert_eq!(page_from_pairs(&pairs("page=%32")), 2);
    }
}
