/// Detail screen for one stored photo
use iced::widget::image::Handle;
use iced::widget::{button, canvas, column, container, row, scrollable, text, Image};
use iced::{Alignment, Element, Length};
use uuid::Uuid;

use super::list::added_label;
use super::map::MapCanvas;
use crate::state::data::{Coordinate, PhotoRecord, Region};
use crate::Message;

/// Span of the detail map around the pin
pub const DETAIL_SPAN_DEGREES: f64 = 0.01;

const MIN_SCALE: f32 = 0.5;
const MAX_SCALE: f32 = 5.0;
const BASE_WIDTH: f32 = 480.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailMode {
    Photo,
    Map,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    record_id: Uuid,
    location: Option<Coordinate>,
    mode: DetailMode,
    scale: f32,
    /// Reverse-geocoded text for the pin, once known
    address: Option<String>,
    address_requested: bool,
}

impl DetailState {
    pub fn new(record: &PhotoRecord) -> Self {
        Self {
            record_id: record.id,
            location: record.location,
            mode: DetailMode::Photo,
            scale: 1.0,
            address: None,
            address_requested: false,
        }
    }

    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    pub fn mode(&self) -> DetailMode {
        self.mode
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Switch modes. Map is refused for records without a location.
    ///
    /// Returns the coordinate to reverse geocode the first time the map is
    /// shown.
    pub fn select_mode(&mut self, mode: DetailMode) -> Option<Coordinate> {
        if mode == DetailMode::Map && self.location.is_none() {
            return None;
        }
        self.mode = mode;

        if mode == DetailMode::Map && !self.address_requested {
            self.address_requested = true;
            return self.location;
        }
        None
    }

    pub fn set_address(&mut self, address: String) {
        self.address = Some(address);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.scale = (self.scale + delta).clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn zoom_reset(&mut self) {
        self.scale = 1.0;
    }

    /// The name label gets out of the way of a magnified photo
    pub fn label_visible(&self) -> bool {
        self.scale <= 1.0
    }
}

fn photo_view<'a>(
    record: &'a PhotoRecord,
    state: &DetailState,
    image: Option<&'a Handle>,
) -> Element<'a, Message> {
    let picture: Element<'a, Message> = match image {
        Some(handle) => Image::new(handle.clone())
            .width(Length::Fixed(BASE_WIDTH * state.scale()))
            .into(),
        None => text("Unable to display this photo").into(),
    };

    let mut content = column![scrollable(picture).height(Length::Fill)]
        .spacing(12)
        .align_x(Alignment::Center);

    if state.label_visible() {
        content = content.push(text(record.name.as_str()).size(22));
    }

    content
        .push(
            row![
                button("−").on_press(Message::DetailZoom(-0.25)),
                text(format!("{:.0}%", state.scale() * 100.0)),
                button("+").on_press(Message::DetailZoom(0.25)),
                button("Reset").on_press(Message::DetailZoomReset),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
        )
        .into()
}

fn map_view<'a>(state: &'a DetailState, location: Coordinate) -> Element<'a, Message> {
    let map = canvas(MapCanvas {
        region: Region::new(location, DETAIL_SPAN_DEGREES),
        pin: Some(location),
        interactive: false,
    })
    .width(Length::Fill)
    .height(Length::Fill);

    column![
        map,
        text(state.address().unwrap_or("Loading address...")).size(16),
    ]
    .spacing(12)
    .into()
}

/// Build the detail screen
pub fn view<'a>(
    record: &'a PhotoRecord,
    state: &'a DetailState,
    image: Option<&'a Handle>,
) -> Element<'a, Message> {
    let header = row![
        button("← Back").on_press(Message::BackToList),
        text(record.name.as_str()).size(24).width(Length::Fill),
        button("Share").on_press(Message::SharePhoto),
        button("Edit").on_press(Message::EditPhoto),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mode_button = |label: &'static str, mode: DetailMode, enabled: bool| {
        let style = if state.mode() == mode {
            button::primary
        } else {
            button::secondary
        };
        button(label)
            .style(style)
            .on_press_maybe(enabled.then_some(Message::DetailModeSelected(mode)))
    };

    let modes = row![
        mode_button("Photo", DetailMode::Photo, true),
        mode_button("Map", DetailMode::Map, record.location.is_some()),
    ]
    .spacing(4);

    let body = match (state.mode(), record.location) {
        (DetailMode::Map, Some(location)) => map_view(state, location),
        _ => photo_view(record, state, image),
    };

    let footer = column![
        text(added_label(record)).size(14),
        text(record.city_label()).size(14),
    ]
    .spacing(4);

    container(column![header, modes, body, footer].spacing(16).padding(24))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located() -> PhotoRecord {
        PhotoRecord::new("Pier", vec![1]).with_location(Some(Coordinate::new(37.8, -122.4)))
    }

    #[test]
    fn test_map_mode_needs_a_location() {
        let record = PhotoRecord::new("Indoors", vec![1]);
        let mut state = DetailState::new(&record);

        assert_eq!(state.select_mode(DetailMode::Map), None);
        assert_eq!(state.mode(), DetailMode::Photo);
    }

    #[test]
    fn test_address_requested_once() {
        let record = located();
        let mut state = DetailState::new(&record);

        assert_eq!(state.select_mode(DetailMode::Map), record.location);
        assert_eq!(state.mode(), DetailMode::Map);

        state.select_mode(DetailMode::Photo);
        assert_eq!(state.select_mode(DetailMode::Map), None);
        assert_eq!(state.mode(), DetailMode::Map);
    }

    #[test]
    fn test_address_pending_until_set() {
        let mut state = DetailState::new(&located());
        state.select_mode(DetailMode::Map);
        assert_eq!(state.address(), None);

        state.set_address("Pier 39, San Francisco".into());
        assert_eq!(state.address(), Some("Pier 39, San Francisco"));
    }

    #[test]
    fn test_label_hidden_above_unit_scale() {
        let mut state = DetailState::new(&located());
        assert!(state.label_visible());

        state.zoom_by(0.25);
        assert!(!state.label_visible());

        state.zoom_reset();
        assert!(state.label_visible());
        assert_eq!(state.scale(), 1.0);

        state.zoom_by(-0.25);
        assert!(state.label_visible());
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut state = DetailState::new(&located());
        state.zoom_by(100.0);
        assert_eq!(state.scale(), MAX_SCALE);
        state.zoom_by(-100.0);
        assert_eq!(state.scale(), MIN_SCALE);
    }
}
