//! Live details for a page of stored places.

use {
    askgeorge_places::Place,
    askgeorge_providers::{BusinessStatus, LinkShortener, PlaceDetails, PlaceDetailsProvider},
    chrono::{DateTime, Utc},
    chrono_tz::Tz,
    futures::future::try_join_all,
};

use crate::hours::{TEMPORARILY_CLOSED, todays_line};

/// A stored place merged with what the providers say about it right now.
#[derive(Debug, Clone)]
pub struct EnrichedPlace {
    pub place: Place,
    pub details: PlaceDetails,
    /// Hours as displayed; `None` renders as "na".
    pub hours: Option<String>,
    pub short_url: String,
}

/// Fetch details and a short link for every place concurrently.
///
/// All or nothing: the first failure fails the whole page, so a reply never
/// lists only some of the nearest places.
pub async fn enrich_page(
    details: &dyn PlaceDetailsProvider,
    shortener: &dyn LinkShortener,
    places: Vec<Place>,
    now: DateTime<Utc>,
    tz: Tz,
) -> askgeorge_providers::Result<Vec<EnrichedPlace>> {
    try_join_all(places.into_iter().map(|place| async move {
        let live = details.place_details(&place.place_ref).await?;
        let short_url = shortener.shorten(&live.url).await?;
        let hours = display_hours(&place, &live, now, tz);
        Ok::<_, askgeorge_providers::Error>(EnrichedPlace {
            place,
            details: live,
            hours,
            short_url,
        })
    }))
    .await
}

/// Temporary closure beats any hours; live hours beat cached ones.
fn display_hours(
    place: &Place,
    live: &PlaceDetails,
    now: DateTime<Utc>,
    tz: Tz,
) -> Option<String> {
    if live.status == BusinessStatus::ClosedTemporarily {
        return Some(TEMPORARILY_CLOSED.to_string());
    }
    live.weekday_hours
        .as_deref()
        .and_then(|week| todays_line(week, now, tz))
        .or_else(|| place.hours.clone())
}

/// A store update learned from live details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
    /// Weekly lines joined by newlines.
    Hours { id: i64, hours: String },
    /// Only for places stored without a name.
    Name { id: i64, name: String },
}

#[must_use]
pub fn cache_writes(page: &[EnrichedPlace]) -> Vec<CacheWrite> {
    let mut writes = Vec::new();
    for p in page {
        if let Some(week) = &p.details.weekday_hours {
            writes.push(CacheWrite::Hours {
                id: p.place.id,
                hours: week.join("\n"),
            });
        }
        if p.place.name.is_none()
            && let Some(name) = &p.details.name
        {
            writes.push(CacheWrite::Name {
                id: p.place.id,
                name: name.clone(),
            });
        }
    }
    writes
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        askgeorge_providers::Error as ProviderError,
        async_trait::async_trait,
        chrono::TimeZone,
        chrono_tz::America::New_York,
        std::collections::HashMap,
    };

    struct Details(HashMap<&'static str, PlaceDetails>);

    #[async_trait]
    impl PlaceDetailsProvider for Details {
        async fn place_details(&self, place_ref: &str) -> askgeorge_providers::Result<PlaceDetails> {
            self.0.get(place_ref).cloned().ok_or_else(|| ProviderError::Api {
                service: "fake details",
                status: "NOT_FOUND".into(),
                message: place_ref.into(),
            })
        }
    }

    struct Shortener;

    #[async_trait]
    impl LinkShortener for Shortener {
        async fn shorten(&self, url: &str) -> askgeorge_providers::Result<String> {
            Ok(format!("bit.ly/{}", url.len()))
        }
    }

    fn place(id: i64, name: Option<&str>, hours: Option<&str>) -> Place {
        Place {
            id,
            place_ref: format!("ref-{id}"),
            name: name.map(String::from),
            hours: hours.map(String::from),
            category: None,
            distance: 0.2,
        }
    }

    fn live(status: BusinessStatus, week: Option<Vec<&str>>) -> PlaceDetails {
        PlaceDetails {
            name: Some("Live Name".into()),
            weekday_hours: week.map(|w| w.into_iter().map(String::from).collect()),
            status,
            url: "https://maps.google.com/?cid=1".into(),
        }
    }

    fn full_week() -> Vec<&'static str> {
        vec![
            "Monday: 6:00 AM – 10:00 PM",
            "Tuesday: 6:00 AM – 10:00 PM",
            "Wednesday: 6:00 AM – 10:00 PM",
            "Thursday: 6:00 AM – 10:00 PM",
            "Friday: 6:00 AM – 10:00 PM",
            "Saturday: 8:00 AM – 8:00 PM",
            "Sunday: Closed",
        ]
    }

    /// A Saturday afternoon in New York.
    fn saturday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 8, 18, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn page_keeps_store_order() {
        let provider = Details(HashMap::from([
            ("ref-1", live(BusinessStatus::Operational, Some(full_week()))),
            ("ref-2", live(BusinessStatus::Operational, None)),
        ]));
        let page = enrich_page(
            &provider,
            &Shortener,
            vec![place(1, None, None), place(2, Some("Stored"), Some("cached"))],
            saturday(),
            New_York,
        )
        .await
        .unwrap();

        assert_eq!(page[0].place.id, 1);
        assert_eq!(page[0].hours.as_deref(), Some("Saturday, 8:00 AM – 8:00 PM"));
        assert_eq!(page[0].short_url, "bit.ly/30");
        assert_eq!(page[1].hours.as_deref(), Some("cached"));
    }

    #[tokio::test]
    async fn one_failure_fails_the_page() {
        let provider = Details(HashMap::from([(
            "ref-1",
            live(BusinessStatus::Operational, None),
        )]));
        let result = enrich_page(
            &provider,
            &Shortener,
            vec![place(1, None, None), place(2, None, None)],
            saturday(),
            New_York,
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn temporary_closure_overrides_live_hours() {
        let hours = display_hours(
            &place(1, None, Some("cached")),
            &live(BusinessStatus::ClosedTemporarily, Some(full_week())),
            saturday(),
            New_York,
        );
        assert_eq!(hours.as_deref(), Some(TEMPORARILY_CLOSED));
    }

    #[test]
    fn no_hours_anywhere() {
        let hours = display_hours(
            &place(1, None, None),
            &live(BusinessStatus::Operational, None),
            saturday(),
            New_York,
        );
        assert!(hours.is_none());
    }

    #[test]
    fn cache_writes_cover_hours_and_missing_names() {
        let page = vec![
            EnrichedPlace {
                place: place(1, None, None),
                details: live(BusinessStatus::Operational, Some(vec!["Monday: Open 24 hours"])),
                hours: None,
                short_url: String::new(),
            },
            EnrichedPlace {
                place: place(2, Some("Stored"), None),
                details: live(BusinessStatus::Operational, None),
                hours: None,
                short_url: String::new(),
            },
        ];
        assert_eq!(cache_writes(&page), [
            CacheWrite::Hours {
                id: 1,
                hours: "Monday: Open 24 hours".into()
            },
            CacheWrite::Name {
                id: 1,
                name: "Live Name".into()
            },
        ]);
    }

    #[test]
    fn weekly_hours_cache_joined_by_newlines() {
        let page = vec![EnrichedPlace {
            place: place(3, Some("x"), None),
            details: live(BusinessStatus::Operational, Some(full_week())),
            hours: None,
            short_url: String::new(),
        }];
        let [CacheWrite::Hours { hours, .. }] =
            <[CacheWrite; 1]>::try_from(cache_writes(&page)).unwrap()
        else {
            panic!("expected one hours write");
        };
        assert_eq!(hours.lines().count(), 7);
        assert!(hours.ends_with("Sunday: Closed"));
    }
}
