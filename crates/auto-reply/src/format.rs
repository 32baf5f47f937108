//! Reply text rendering.

use crate::enrich::EnrichedPlace;

/// Placeholder for a missing name, category, or hours.
const NOT_AVAILABLE: &str = "na";

/// Distance in miles, truncated to one decimal: `1.27` renders as `1.2 mi`.
/// Anything under a tenth of a mile renders as `<0.1 mi`.
#[must_use]
pub fn format_distance(miles: f64) -> String {
    if miles < 0.1 {
        return "<0.1 mi".to_string();
    }
    let tenths = (miles * 10.0).trunc() as u64;
    format!("{}.{} mi", tenths / 10, tenths % 10)
}

/// One result block.
#[must_use]
pub fn format_place(place: &EnrichedPlace) -> String {
    let name = place
        .place
        .name
        .as_deref()
        .or(place.details.name.as_deref())
        .unwrap_or(NOT_AVAILABLE);
    let category = place.place.category.as_deref().unwrap_or(NOT_AVAILABLE);
    let hours = place.hours.as_deref().unwrap_or(NOT_AVAILABLE);

    format!(
        "Name: {name}\nType: {category}\nDistance: {}\nHours: {hours}\nDirections: {}",
        format_distance(place.place.distance),
        place.short_url,
    )
}

/// Blocks in page order separated by blank lines, then the continuation hint.
#[must_use]
pub fn format_page(places: &[EnrichedPlace], more_hint: &str) -> String {
    places
        .iter()
        .map(format_place)
        .chain(std::iter::once(more_hint.to_string()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        askgeorge_places::Place,
        askgeorge_providers::{BusinessStatus, PlaceDetails},
        rstest::rstest,
    };

    fn enriched(name: Option<&str>, live_name: Option<&str>, hours: Option<&str>) -> EnrichedPlace {
        EnrichedPlace {
            place: Place {
                id: 1,
                place_ref: "ChIJ1".into(),
                name: name.map(String::from),
                hours: None,
                category: Some("Park".into()),
                distance: 0.34,
            },
            details: PlaceDetails {
                name: live_name.map(String::from),
                weekday_hours: None,
                status: BusinessStatus::Operational,
                url: "https://maps.google.com/?cid=1".into(),
            },
            hours: hours.map(String::from),
            short_url: "bit.ly/abc".into(),
        }
    }

    #[rstest]
    #[case::tiny(0.05, "<0.1 mi")]
    #[case::zero(0.0, "<0.1 mi")]
    #[case::boundary(0.1, "0.1 mi")]
    #[case::truncates(1.27, "1.2 mi")]
    #[case::truncates_high(0.99, "0.9 mi")]
    #[case::whole(3.0, "3.0 mi")]
    #[case::double_digits(12.96, "12.9 mi")]
    fn distances(#[case] miles: f64, #[case] expected: &str) {
        assert_eq!(format_distance(miles), expected);
    }

    #[test]
    fn block_layout() {
        let block = format_place(&enriched(
            Some("Bryant Park"),
            None,
            Some("Monday, 7:00 AM – 11:00 PM"),
        ));
        assert_eq!(
            block,
            "Name: Bryant Park\n\
             Type: Park\n\
             Distance: 0.3 mi\n\
             Hours: Monday, 7:00 AM – 11:00 PM\n\
             Directions: bit.ly/abc"
        );
    }

    #[test]
    fn stored_name_wins_over_live_name() {
        let block = format_place(&enriched(Some("Stored"), Some("Live"), None));
        assert!(block.starts_with("Name: Stored\n"));
    }

    #[test]
    fn live_name_fills_missing_stored_name() {
        let block = format_place(&enriched(None, Some("Live"), None));
        assert!(block.starts_with("Name: Live\n"));
    }

    #[test]
    fn missing_fields_render_na() {
        let mut place = enriched(None, None, None);
        place.place.category = None;
        let block = format_place(&place);
        assert!(block.contains("Name: na\n"));
        assert!(block.contains("Type: na\n"));
        assert!(block.contains("Hours: na\n"));
    }

    #[test]
    fn page_joins_blocks_and_appends_hint() {
        let page = format_page(
            &[enriched(Some("A"), None, None), enriched(Some("B"), None, None)],
            "Text NEXT for more results",
        );
        let parts: Vec<_> = page.split("\n\n").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].starts_with("Name: A"));
        assert!(parts[1].starts_with("Name: B"));
        assert_eq!(parts[2], "Text NEXT for more results");
    }
}
