/// Add-photo, map-picker and edit screens
use iced::widget::image::Handle;
use iced::widget::{button, canvas, column, container, row, text, text_input, Column, Image};
use iced::{Alignment, Element, Length};

use super::map::MapCanvas;
use crate::state::data::Region;
use crate::state::draft::{Draft, Phase};
use crate::state::edit::EditSession;
use crate::Message;

const PREVIEW_WIDTH: f32 = 320.0;

fn preview<'a>(handle: Option<&'a Handle>, empty: &'a str) -> Element<'a, Message> {
    match handle {
        Some(handle) => Image::new(handle.clone())
            .width(Length::Fixed(PREVIEW_WIDTH))
            .into(),
        None => container(text(empty))
            .width(Length::Fixed(PREVIEW_WIDTH))
            .height(Length::Fixed(PREVIEW_WIDTH * 0.75))
            .center_x(Length::Fixed(PREVIEW_WIDTH))
            .center_y(Length::Fixed(PREVIEW_WIDTH * 0.75))
            .style(container::rounded_box)
            .into(),
    }
}

fn error_banner<'a>(message: &'a str, dismiss: Message) -> Element<'a, Message> {
    container(
        row![
            text(message).width(Length::Fill),
            button("OK").on_press(dismiss),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
    )
    .padding(10)
    .style(container::rounded_box)
    .into()
}

/// Build the add-photo screen
pub fn add_view<'a>(draft: &'a Draft, phase: Phase, image: Option<&'a Handle>) -> Element<'a, Message> {
    let saving = phase == Phase::Saving;

    let mut content = column![
        text("Add Photo").size(28),
        preview(image, "No photo selected"),
        button("Select Photo").on_press(Message::PickPhoto),
        text_input("Name", &draft.name)
            .on_input(Message::NameChanged)
            .padding(8),
        text_input("Address", &draft.address)
            .on_input(Message::AddressChanged)
            .on_submit(Message::UseAddress)
            .padding(8),
    ]
    .spacing(12);

    // Live suggestions under the address field
    if !draft.suggestions.is_empty() {
        let rows = Column::with_children(draft.suggestions.iter().enumerate().map(|(i, s)| {
            button(column![text(s.title.as_str()), text(s.subtitle.as_str()).size(12)])
                .style(button::secondary)
                .width(Length::Fill)
                .on_press(Message::SuggestionPicked(i))
                .into()
        }))
        .spacing(2);
        content = content.push(rows);
    }

    content = content.push(
        row![
            button("Use Address").on_press(Message::UseAddress),
            button("Pick on Map").on_press(Message::OpenMapPicker),
        ]
        .spacing(10),
    );

    if let Some(coordinate) = draft.coordinate {
        content = content.push(text(format!("Location: {}", coordinate)).size(14));
    }
    if let Some(label) = &draft.location_label {
        content = content.push(text(label.as_str()).size(14));
    }

    if let Some(error) = &draft.error {
        content = content.push(error_banner(error, Message::DismissError));
    }

    let save = button(if saving { "Saving..." } else { "Save" })
        .on_press_maybe((draft.can_save() && !saving).then_some(Message::SavePhoto));

    content = content.push(
        row![
            button("Cancel")
                .style(button::secondary)
                .on_press(Message::CancelAdd),
            save,
        ]
        .spacing(10),
    );

    container(content.padding(24).max_width(640))
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}

/// Build the map picker
pub fn map_picker_view<'a>(draft: &'a Draft, region: Region) -> Element<'a, Message> {
    let map = canvas(MapCanvas {
        region,
        pin: draft.coordinate,
        interactive: true,
    })
    .width(Length::Fill)
    .height(Length::Fill);

    let label = match (&draft.location_label, draft.coordinate) {
        (Some(label), _) => label.clone(),
        (None, Some(coordinate)) => format!("Looking up {}...", coordinate),
        (None, None) => "Click the map to choose a location".to_string(),
    };

    let controls = row![
        button("−").on_press(Message::MapZoom(-1.0)),
        button("+").on_press(Message::MapZoom(1.0)),
        text(label).width(Length::Fill),
        button("Close").on_press(Message::CloseMapPicker),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    column![map, controls].spacing(12).padding(24).into()
}

/// Build the edit screen. `current` is the stored photo.
pub fn edit_view<'a>(
    session: &'a EditSession,
    replacement: Option<&'a Handle>,
    current: Option<&'a Handle>,
) -> Element<'a, Message> {
    let shown = replacement.or(current);

    let mut content = column![
        text("Edit Photo").size(28),
        preview(shown, "No preview"),
        button(if session.has_new_photo() {
            "Choose Another Photo"
        } else {
            "Replace Photo"
        })
        .on_press(Message::EditPickPhoto),
        text_input(&session.record().name, &session.name)
            .on_input(Message::EditNameChanged)
            .on_submit(Message::EditSave)
            .padding(8),
    ]
    .spacing(12);

    if let Some(error) = &session.error {
        content = content.push(error_banner(error, Message::EditDismissError));
    }

    content = content.push(
        row![
            button("Cancel")
                .style(button::secondary)
                .on_press(Message::EditCancel),
            button("Save").on_press_maybe(session.can_save().then_some(Message::EditSave)),
        ]
        .spacing(10),
    );

    container(content.padding(24).max_width(640))
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .into()
}
