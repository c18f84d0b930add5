//! Bus feed parsers: route list, direction list, arrival predictions.
//!
//! Same single-current-field discipline as the train parser, with simpler
//! flat grammars and no reference-store cross-referencing. Direction
//! strings are the one enumerated value: matched loosely, and an
//! unrecognized bound skips that entry rather than failing the document.

use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::models::arrivals::{BusArrival, BusRoute, BUS_DATE_FORMAT};
use crate::models::types::{Direction, Result, TransitError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BusTag {
    Tmstmp,
    Stpnm,
    Stpid,
    Vid,
    Dstp,
    Rt,
    Rtnm,
    Rtdir,
    Des,
    Prdtm,
    Dly,
    Dir,
    Other,
}

impl BusTag {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"tmstmp" => BusTag::Tmstmp,
            b"stpnm" => BusTag::Stpnm,
            b"stpid" => BusTag::Stpid,
            b"vid" => BusTag::Vid,
            b"dstp" => BusTag::Dstp,
            b"rt" => BusTag::Rt,
            b"rtnm" => BusTag::Rtnm,
            b"rtdir" => BusTag::Rtdir,
            b"des" => BusTag::Des,
            b"prdtm" => BusTag::Prdtm,
            b"dly" => BusTag::Dly,
            b"dir" => BusTag::Dir,
            _ => BusTag::Other,
        }
    }
}

/// Walk a bus payload, handing each (container-start, field, text) to the
/// two closures. `open` fires on every start tag so record grammars can
/// begin a fresh record on their container element.
fn walk<S>(
    payload: &str,
    state: &mut S,
    mut open: impl FnMut(&mut S, &[u8]),
    mut apply: impl FnMut(&mut S, BusTag, &str),
) -> Result<()> {
    let mut reader = Reader::from_str(payload);
    reader.config_mut().trim_text(true);

    let mut current: Option<BusTag> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                open(state, e.local_name().as_ref());
                current = Some(BusTag::from_name(e.local_name().as_ref()));
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| TransitError::FeedParse(e.to_string()))?;
                if let Some(tag) = current {
                    apply(state, tag, text.trim());
                }
            }
            Ok(Event::End(_) | Event::Empty(_)) => current = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(TransitError::FeedParse(e.to_string())),
        }
    }

    Ok(())
}

/// Parse the route-list grammar (`route{rt, rtnm}`).
pub fn parse_bus_routes(payload: &str) -> Result<Vec<BusRoute>> {
    let mut routes: Vec<BusRoute> = Vec::new();

    walk(
        payload,
        &mut routes,
        |routes, name| {
            if name == b"route" {
                routes.push(BusRoute {
                    id: String::new(),
                    name: String::new(),
                });
            }
        },
        |routes, tag, text| {
            let Some(route) = routes.last_mut() else {
                return;
            };
            match tag {
                BusTag::Rt => route.id = text.to_string(),
                BusTag::Rtnm => route.name = text.to_string(),
                _ => {}
            }
        },
    )?;

    Ok(routes)
}

/// Parse the direction-list grammar (`dir` entries). Entries that match no
/// known bound are skipped with a warning.
pub fn parse_bus_directions(payload: &str) -> Result<Vec<Direction>> {
    let mut directions = Vec::new();

    walk(payload, &mut directions, |_, _| {}, |directions, tag, text| {
        if tag != BusTag::Dir {
            return;
        }
        match Direction::from_feed_text(text) {
            Ok(direction) => directions.push(direction),
            Err(e) => warn!(error = %e, "direction entry skipped"),
        }
    })?;

    Ok(directions)
}

/// Parse the arrival-prediction grammar (`prd` records).
pub fn parse_bus_arrivals(payload: &str) -> Result<Vec<BusArrival>> {
    let mut arrivals: Vec<BusArrival> = Vec::new();

    walk(
        payload,
        &mut arrivals,
        |arrivals, name| {
            if name == b"prd" {
                arrivals.push(BusArrival::new());
            }
        },
        |arrivals, tag, text| {
            let Some(arrival) = arrivals.last_mut() else {
                return;
            };
            match tag {
                BusTag::Tmstmp => arrival.timestamp = parse_bus_date("tmstmp", text),
                BusTag::Stpnm => arrival.stop_name = text.to_string(),
                BusTag::Stpid => arrival.stop_id = parse_num("stpid", text),
                BusTag::Vid => arrival.bus_id = parse_num("vid", text),
                BusTag::Dstp => arrival.distance_feet = parse_num("dstp", text),
                BusTag::Rt => arrival.route_id = text.to_string(),
                BusTag::Rtdir => match Direction::from_feed_text(text) {
                    Ok(direction) => arrival.direction = Some(direction),
                    Err(e) => warn!(error = %e, "bound left unset"),
                },
                BusTag::Des => arrival.destination = text.to_string(),
                BusTag::Prdtm => arrival.predicted_at = parse_bus_date("prdtm", text),
                BusTag::Dly => arrival.is_delayed = text == "true" || text == "1",
                _ => {}
            }
        },
    )?;

    Ok(arrivals)
}

fn parse_bus_date(field: &'static str, value: &str) -> Option<NaiveDateTime> {
    match NaiveDateTime::parse_from_str(value, BUS_DATE_FORMAT) {
        Ok(at) => Some(at),
        Err(_) => {
            warn!(field, value, "field skipped");
            None
        }
    }
}

fn parse_num(field: &'static str, value: &str) -> Option<u32> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(field, value, "field skipped");
            None
        }
    }
}
