//! Conversion from wire DTOs to session domain types.

use crate::session::{Board, CallingPoint, FilterKind, ServiceDetail, ServiceId, ServiceSummary};

use super::types::{ServiceDetailsResponse, ServiceItem, StationBoard};

/// Build a [`Board`] from a departure-board response.
///
/// Missing optional fields degrade to empty strings rather than dropping the
/// row; the id must always be present for detail lookup to work.
pub fn board_from_wire(dto: StationBoard) -> Board {
    let services = dto
        .train_services
        .unwrap_or_default()
        .into_iter()
        .map(service_from_wire)
        .collect();

    let messages = dto
        .nrcc_messages
        .unwrap_or_default()
        .into_iter()
        .map(|m| decode_entities(&m.value))
        .collect();

    let filter_kind = match dto.filter_type.as_deref() {
        Some("from") => FilterKind::From,
        _ => FilterKind::To,
    };

    Board {
        origin_name: dto.location_name,
        filter_kind,
        destination_name: dto.filter_location_name,
        services,
        messages,
    }
}

fn service_from_wire(item: ServiceItem) -> ServiceSummary {
    let destination = item
        .destination
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|loc| loc.location_name)
        .unwrap_or_default();

    ServiceSummary {
        id: ServiceId::new(item.service_id),
        scheduled: item.std.unwrap_or_default(),
        destination,
        platform: item.platform,
        estimated: item.etd.unwrap_or_default(),
        operator: item.operator.unwrap_or_default(),
    }
}

/// Build a [`ServiceDetail`] from a service-details response, keeping only
/// the first subsequent leg.
pub fn detail_from_wire(dto: ServiceDetailsResponse) -> ServiceDetail {
    let calling_points = dto
        .subsequent_calling_points
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|leg| {
            leg.calling_point
                .into_iter()
                .map(|point| CallingPoint {
                    scheduled: point.st.unwrap_or_default(),
                    location: point.location_name,
                    estimated: point.et.unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    ServiceDetail { calling_points }
}

/// Decode the HTML entities that appear in NRCC advisory bodies.
fn decode_entities(input: &str) -> String {
    input
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
