//! Train-arrival feed parser.
//!
//! Single forward pass over the payload's tag events. A `staId` text event
//! opens a new [`Eta`] under that station's [`TrainArrival`]; every later
//! field lands on the most recently opened Eta. The feed's station/stop
//! names override the bundled reference names for the session.
//!
//! Field-level damage (bad date, non-numeric id) is absorbed here: the
//! field is logged and left unset, the record is kept. Only a malformed
//! document aborts the fetch.

use chrono::NaiveDateTime;
use geo::Point;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::feed::tags::TrainTag;
use crate::identifiers::{StationId, StopId};
use crate::models::arrivals::{Eta, TrainArrivalMap, TRAIN_DATE_FORMAT};
use crate::models::types::{Line, Result, TransitError};
use crate::reference::ReferenceDataStore;

/// Parse one train-arrival payload into per-station results.
///
/// A `staId` unknown to the reference store still yields a placeholder Eta:
/// the parser's job is lossless capture of what the feed sent, and later
/// stages may choose to omit it.
pub fn parse_train_arrivals(
    payload: &str,
    reference: &ReferenceDataStore,
) -> Result<TrainArrivalMap> {
    let mut reader = Reader::from_str(payload);
    reader.config_mut().trim_text(true);

    let mut parser = TrainParser::new(reference);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => parser.open_tag(TrainTag::from_name(e.local_name().as_ref())),
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| TransitError::FeedParse(e.to_string()))?;
                parser.text(text.trim());
            }
            Ok(Event::End(_) | Event::Empty(_)) => parser.close_tag(),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(TransitError::FeedParse(e.to_string())),
        }
    }

    Ok(parser.finish())
}

struct TrainParser<'a> {
    reference: &'a ReferenceDataStore,
    arrivals: TrainArrivalMap,
    current: Option<TrainTag>,
    /// Station of the most recently opened Eta; `None` until the first
    /// `staId`, or after one that would not parse.
    current_station: Option<StationId>,
    timestamp: Option<NaiveDateTime>,
    error_code: Option<u32>,
    error_message: Option<String>,
}

impl<'a> TrainParser<'a> {
    fn new(reference: &'a ReferenceDataStore) -> Self {
        Self {
            reference,
            arrivals: TrainArrivalMap::new(),
            current: None,
            current_station: None,
            timestamp: None,
            error_code: None,
            error_message: None,
        }
    }

    fn open_tag(&mut self, tag: TrainTag) {
        self.current = Some(tag);
    }

    fn close_tag(&mut self) {
        self.current = None;
    }

    fn text(&mut self, text: &str) {
        let Some(tag) = self.current else {
            return;
        };

        match tag {
            TrainTag::Tmst => self.timestamp = parse_date("tmst", text),
            TrainTag::ErrCd => self.error_code = parse_num("errCd", text),
            TrainTag::ErrNm => {
                if !text.is_empty() {
                    self.error_message = Some(text.to_string());
                }
            }
            TrainTag::StaId => self.open_eta(text),
            TrainTag::StpId => self.attach_stop(text),
            TrainTag::StaNm => {
                if let Some(eta) = self.current_eta() {
                    eta.station_name = text.to_string();
                }
            }
            TrainTag::StpDe => {
                if let Some(eta) = self.current_eta() {
                    eta.stop_description = text.to_string();
                }
            }
            TrainTag::Rn => {
                if let Some(eta) = self.current_eta() {
                    eta.run_number = text.to_string();
                }
            }
            TrainTag::Rt => {
                let line = Line::from_feed_code(text);
                if let Some(eta) = self.current_eta() {
                    eta.line = line;
                }
            }
            TrainTag::DestSt => {
                let id = parse_num::<StationId>("destSt", text);
                if let Some(eta) = self.current_eta() {
                    eta.destination_id = id;
                }
            }
            TrainTag::DestNm => {
                if let Some(eta) = self.current_eta() {
                    eta.destination_name = text.to_string();
                }
            }
            TrainTag::TrDr => {
                if let Some(eta) = self.current_eta() {
                    eta.direction_code = Some(text.to_string());
                }
            }
            TrainTag::Prdt => {
                let at = parse_date("prdt", text);
                if let Some(eta) = self.current_eta() {
                    eta.predicted_at = at;
                }
            }
            TrainTag::ArrT => {
                let at = parse_date("arrT", text);
                if let Some(eta) = self.current_eta() {
                    eta.arrival_at = at;
                }
            }
            TrainTag::IsApp => {
                let flag = text == "1";
                if let Some(eta) = self.current_eta() {
                    eta.is_approaching = flag;
                }
            }
            TrainTag::IsSch => {
                let flag = text == "1";
                if let Some(eta) = self.current_eta() {
                    eta.is_scheduled = flag;
                }
            }
            TrainTag::IsDly => {
                let flag = text == "1";
                if let Some(eta) = self.current_eta() {
                    eta.is_delayed = flag;
                }
            }
            TrainTag::IsFlt => {
                let flag = text == "1";
                if let Some(eta) = self.current_eta() {
                    eta.is_fault = flag;
                }
            }
            TrainTag::Lat => {
                // lat opens the position; the lon that always follows
                // completes it in place.
                let lat = parse_float("lat", text);
                if let (Some(lat), Some(eta)) = (lat, self.current_eta()) {
                    eta.position = Some(Point::new(0.0, lat));
                }
            }
            TrainTag::Lon => {
                let lon = parse_float("lon", text);
                if let (Some(lon), Some(eta)) = (lon, self.current_eta()) {
                    if let Some(position) = eta.position.as_mut() {
                        position.set_x(lon);
                    }
                }
            }
            TrainTag::Heading => {
                let heading = parse_float("heading", text);
                if let Some(eta) = self.current_eta() {
                    eta.heading = heading;
                }
            }
            TrainTag::Other => {}
        }
    }

    /// A `staId` opens a new Eta under that station's TrainArrival.
    fn open_eta(&mut self, text: &str) {
        let Some(station_id) = parse_num::<StationId>("staId", text) else {
            // Without a key the record cannot be placed; make sure trailing
            // fields do not land on the previous Eta.
            self.current_station = None;
            return;
        };

        let station_name = match self.reference.station_by_id(station_id) {
            Some(station) => station.name.to_string(),
            None => String::new(),
        };

        self.current_station = Some(station_id);
        self.arrivals
            .entry(station_id)
            .or_default()
            .etas
            .push(Eta::new(station_id, station_name));
    }

    fn attach_stop(&mut self, text: &str) {
        let Some(stop_id) = parse_num::<StopId>("stpId", text) else {
            return;
        };
        let stop = self.reference.stop_by_id(stop_id);
        if let Some(eta) = self.current_eta() {
            eta.stop_id = Some(stop_id);
            if let Some(stop) = stop {
                eta.stop_description = stop.description.to_string();
                eta.stop_direction = Some(stop.direction);
            }
        }
    }

    fn current_eta(&mut self) -> Option<&mut Eta> {
        let station = self.current_station?;
        self.arrivals.get_mut(&station)?.etas.last_mut()
    }

    /// Stamp the payload-level timestamp and error onto every station's
    /// result.
    fn finish(mut self) -> TrainArrivalMap {
        for arrival in self.arrivals.values_mut() {
            arrival.timestamp = self.timestamp;
            arrival.error_code = self.error_code;
            arrival.error_message = self.error_message.clone();
        }
        self.arrivals
    }
}

fn parse_date(field: &'static str, value: &str) -> Option<NaiveDateTime> {
    match NaiveDateTime::parse_from_str(value, TRAIN_DATE_FORMAT) {
        Ok(at) => Some(at),
        Err(_) => {
            log_skipped(field, value);
            None
        }
    }
}

fn parse_num<T: std::str::FromStr>(field: &'static str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log_skipped(field, value);
            None
        }
    }
}

fn parse_float(field: &'static str, value: &str) -> Option<f64> {
    parse_num(field, value)
}

fn log_skipped(field: &'static str, value: &str) {
    let err = TransitError::FieldParse {
        field,
        value: value.to_string(),
    };
    warn!(error = %err, "field skipped");
}
