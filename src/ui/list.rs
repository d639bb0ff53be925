/// Photo list screen
use iced::widget::image::Handle;
use iced::widget::{button, column, container, row, scrollable, text, text_input, Column, Image};
use iced::{Alignment, Element, Length};
use std::collections::HashMap;
use uuid::Uuid;

use crate::state::data::{compare_names, name_matches, PhotoRecord};
use crate::Message;

/// Records matching `search`, in display order
pub fn visible_photos<'a>(photos: &'a [PhotoRecord], search: &str) -> Vec<&'a PhotoRecord> {
    let mut visible: Vec<&PhotoRecord> = photos
        .iter()
        .filter(|photo| name_matches(&photo.name, search))
        .collect();
    visible.sort_by(|a, b| compare_names(&a.name, &b.name));
    visible
}

/// "Added: Jan 14, 2025" in local time
pub fn added_label(record: &PhotoRecord) -> String {
    let local = record.date_added.with_timezone(&chrono::Local);
    format!("Added: {}", local.format("%b %-d, %Y"))
}

fn photo_row<'a>(photo: &'a PhotoRecord, thumbnail: Option<&'a Handle>) -> Element<'a, Message> {
    let thumb: Element<'a, Message> = match thumbnail {
        Some(handle) => Image::new(handle.clone())
            .width(Length::Fixed(64.0))
            .height(Length::Fixed(64.0))
            .into(),
        None => container(text("No preview").size(10))
            .width(Length::Fixed(64.0))
            .height(Length::Fixed(64.0))
            .center_x(Length::Fixed(64.0))
            .center_y(Length::Fixed(64.0))
            .into(),
    };

    let details = column![
        text(photo.name.as_str()).size(18),
        text(added_label(photo)).size(14),
        text(photo.city_label()).size(12),
    ]
    .spacing(4)
    .width(Length::Fill);

    row![
        thumb,
        details,
        button("Open").on_press(Message::OpenDetail(photo.id)),
        button("Delete")
            .style(button::danger)
            .on_press(Message::RequestDelete(photo.id)),
    ]
    .spacing(16)
    .align_y(Alignment::Center)
    .into()
}

/// Build the list screen
pub fn view<'a>(
    photos: &'a [PhotoRecord],
    thumbnails: &'a HashMap<Uuid, Handle>,
    search: &'a str,
    pending_delete: Option<&'a PhotoRecord>,
    status: &'a str,
) -> Element<'a, Message> {
    let header = row![
        text("NameSnap").size(32).width(Length::Fill),
        button("+ Add Photo").on_press(Message::AddPhoto).padding(10),
    ]
    .align_y(Alignment::Center);

    let search_box = text_input("Search photos", search)
        .on_input(Message::SearchChanged)
        .padding(8);

    let mut content = column![header, search_box].spacing(16);

    // Confirmation prompt before anything is removed
    if let Some(photo) = pending_delete {
        content = content.push(
            container(
                row![
                    text(format!("Are you sure you want to delete \"{}\"?", photo.name))
                        .width(Length::Fill),
                    button("Delete")
                        .style(button::danger)
                        .on_press(Message::ConfirmDelete),
                    button("Cancel")
                        .style(button::secondary)
                        .on_press(Message::CancelDelete),
                ]
                .spacing(10)
                .align_y(Alignment::Center),
            )
            .padding(10)
            .style(container::rounded_box),
        );
    }

    let visible = visible_photos(photos, search);
    let rows: Column<Message> = if visible.is_empty() {
        column![text(if photos.is_empty() {
            "No photos yet. Add one to get started."
        } else {
            "No photos match your search."
        })]
    } else {
        Column::with_children(
            visible
                .into_iter()
                .map(|photo| photo_row(photo, thumbnails.get(&photo.id))),
        )
        .spacing(12)
    };

    content = content
        .push(text("Saved Photos").size(16))
        .push(scrollable(rows).height(Length::Fill))
        .push(text(status).size(14));

    container(content.padding(24))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(names: &[&str]) -> Vec<PhotoRecord> {
        names.iter().map(|n| PhotoRecord::new(*n, vec![0])).collect()
    }

    fn names<'a>(visible: &[&'a PhotoRecord]) -> Vec<&'a str> {
        visible.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_empty_search_shows_all_sorted() {
        let photos = records(&["mountain", "Beach", "city"]);
        assert_eq!(names(&visible_photos(&photos, "")), vec!["Beach", "city", "mountain"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let photos = records(&["Sunset Beach", "beach hut", "Mountain", "BEACHES"]);
        assert_eq!(
            names(&visible_photos(&photos, "Beach")),
            vec!["beach hut", "BEACHES", "Sunset Beach"]
        );
    }

    #[test]
    fn test_relative_order_is_the_same_for_any_search() {
        let photos = records(&["Zoo", "apple pie", "Apple", "Éclair", "eagle", "apricot"]);
        let all = names(&visible_photos(&photos, ""));

        for search in ["", "a", "p", "e", "zzz", "APPLE"] {
            let filtered = names(&visible_photos(&photos, search));
            let expected: Vec<&str> = all
                .iter()
                .copied()
                .filter(|name| filtered.contains(name))
                .collect();
            assert_eq!(filtered, expected, "search {:?}", search);
        }
    }

    #[test]
    fn test_added_label_format() {
        let record = PhotoRecord::new("Beach", vec![0]);
        assert!(added_label(&record).starts_with("Added: "));
    }
}
