//! # Main Display Module
//!
//! This module contains the main display layout for the Solfege singing
//! trainer: the note readout, the scale ladder and the scale controls.

use iced::widget::{button, column, container, horizontal_space, row, text, Space};
use iced::{Alignment, Element, Length};
use solfege_core::scale::ROOT_KEY_NAMES;

use super::scale_ladder;
use crate::{AppDisplayData, Message};

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Solfege").size(28);

    let readout_panel = create_readout_panel(data);
    let ladder_panel = create_ladder_panel(data);
    let sidebar = create_sidebar(data);

    let main_content = row![
        column![title, Space::with_height(20), readout_panel, ladder_panel]
            .width(Length::Fill)
            .spacing(10),
        Space::with_width(10),
        sidebar,
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Note name and frequency of the latest poll
fn create_readout_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let (note_name, freq_text) = match &data.last_reading {
        Some(reading) => (
            reading.note_label.clone().unwrap_or_else(|| "--".to_string()),
            reading
                .frequency
                .map(|f| format!("{:.1} Hz", f))
                .unwrap_or_else(|| "-- Hz".to_string()),
        ),
        None => ("--".to_string(), "-- Hz".to_string()),
    };

    let status = if data.listening { "Listening" } else { "Stopped" };

    container(
        row![
            text(note_name).size(40),
            Space::with_width(20),
            text(freq_text).size(24),
            horizontal_space(),
            text(status).size(16),
        ]
        .align_y(Alignment::Center)
        .padding(15),
    )
    .width(Length::Fill)
    .into()
}

fn create_ladder_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let position = if data.listening {
        data.last_reading.as_ref().and_then(|r| r.display_position)
    } else {
        None
    };

    let ladder = scale_ladder::ScaleLadder::new(position, data.low_tones, data.high_tones);

    container(
        column![
            text("Scale").size(18),
            Space::with_height(10),
            container(ladder.view())
                .width(Length::Fill)
                .height(Length::Fill),
        ]
        .spacing(5)
        .padding(15),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

/// Listen toggle, root key grid and register controls
fn create_sidebar(data: &AppDisplayData) -> Element<'static, Message> {
    let (listen_label, listen_color) = if data.listening {
        ("Stop", iced::Color::from_rgb(0.8, 0.2, 0.2)) // Red
    } else {
        ("Listen", iced::Color::from_rgb(0.2, 0.6, 0.3)) // Green
    };
    let listen_button = button(text(listen_label).size(18).width(Length::Fill))
        .padding([12, 20])
        .style(move |_theme, _status| button::Style {
            background: Some(iced::Background::Color(listen_color)),
            text_color: iced::Color::WHITE,
            ..button::Style::default()
        })
        .on_press(Message::ToggleListening);

    // Three rows of four keys
    let key_grid = ROOT_KEY_NAMES
        .chunks(4)
        .enumerate()
        .fold(column![].spacing(6), |col, (row_index, names)| {
            let keys = names.iter().enumerate().fold(row![].spacing(6), |r, (i, name)| {
                let root_key = (row_index * 4 + i) as u8;
                r.push(make_root_button(*name, root_key, root_key == data.root_key))
            });
            col.push(keys)
        });

    let octave_controls = row![
        button(text("-").size(16)).on_press(Message::OctaveDown),
        text(format!("Octave {}", data.base_octave)).size(16),
        button(text("+").size(16)).on_press(Message::OctaveUp),
    ]
    .spacing(10)
    .align_y(Alignment::Center);

    let mut sections = column![
        listen_button,
        Space::with_height(10),
        text("Key").size(18),
        key_grid,
        Space::with_height(10),
        text("Register").size(18),
        octave_controls,
    ]
    .spacing(8);

    if let Some(error) = &data.error {
        sections = sections.push(
            text(error.clone())
                .size(14)
                .color(iced::Color::from_rgb(1.0, 0.4, 0.4)),
        );
    }

    container(sections.padding(15))
        .width(Length::Fixed(250.0))
        .height(Length::Fill)
        .into()
}

fn make_root_button(name: &'static str, root_key: u8, selected: bool) -> Element<'static, Message> {
    let mut key_button = button(text(name).size(14)).padding([6, 10]);

    if selected {
        key_button = key_button.style(|_theme, _status| button::Style {
            background: Some(iced::Background::Color(iced::Color::from_rgb(1.0, 0.84, 0.0))), // Gold
            text_color: iced::Color::BLACK,
            ..button::Style::default()
        });
    }

    key_button.on_press(Message::RootSelected(root_key)).into()
}
