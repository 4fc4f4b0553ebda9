//! # Main Display Module
//!
//! Layout of the tuner window: note readout with cent meter on the left,
//! session and reference pitch controls on the right.

use iced::widget::{button, column, container, horizontal_space, row, text, Space};
use iced::{Alignment, Color, Element, Length};
use tuner_core::TunerReading;

use super::cent_meter::CentMeter;
use crate::{AppDisplayData, Message};

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Tuner").size(28);

    let main_content = row![
        column![title, Space::with_height(20), create_note_panel(&data.reading)]
            .width(Length::Fill)
            .spacing(10),
        Space::with_width(10),
        create_sidebar(data),
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Note name, frequency, cents and the needle.
fn create_note_panel(reading: &TunerReading) -> Element<'static, Message> {
    let note_text = match (reading.note_name, reading.octave) {
        (Some(name), Some(octave)) => format!("{}{}", name, octave),
        _ => "--".to_string(),
    };
    let freq_text = reading
        .frequency
        .map(|f| format!("{:.2} Hz", f))
        .unwrap_or_else(|| "-- Hz".to_string());
    let cents_text = reading
        .cents_deviation
        .map(|c| format!("{:+.1} cents", c))
        .unwrap_or_default();

    let content = column![
        row![
            text(note_text).size(64),
            Space::with_width(20),
            column![text(freq_text).size(24), text(cents_text).size(18)].spacing(4),
            horizontal_space(),
        ]
        .align_y(Alignment::Center),
        Space::with_height(10),
        CentMeter::new(reading.cents_deviation).view(),
    ]
    .spacing(5);

    container(
        column![text("Cent Meter").size(18), Space::with_height(10), content]
            .spacing(5)
            .padding(15),
    )
    .width(Length::Fill)
    .into()
}

/// Start/stop, reference pitch and settings controls.
fn create_sidebar(data: &AppDisplayData) -> Element<'static, Message> {
    let (label, message, color) = if data.running {
        ("Stop", Message::Stop, Color::from_rgb(0.8, 0.2, 0.2))
    } else {
        ("Start", Message::Start, Color::from_rgb(0.2, 0.6, 0.3))
    };

    let session_button = button(text(label).size(18).width(Length::Fill))
        .padding([12, 20])
        .style(move |_theme, _status| button::Style {
            background: Some(iced::Background::Color(color)),
            text_color: Color::WHITE,
            ..button::Style::default()
        })
        .on_press(message);

    let reference_row = row![
        button(text("-").size(16)).padding([4, 12]).on_press(Message::ReferenceDown),
        text(format!("A4 = {:.0} Hz", data.reference_frequency)).size(16),
        button(text("+").size(16)).padding([4, 12]).on_press(Message::ReferenceUp),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let mut sections = column![
        session_button,
        Space::with_height(10),
        text("Reference").size(18),
        reference_row,
        Space::with_height(10),
        button(text("Save settings").size(14).width(Length::Fill))
            .padding([6, 10])
            .on_press(Message::SaveSettings),
    ]
    .spacing(10);

    if let Some(status) = &data.status {
        sections = sections.push(text(status.clone()).size(12));
    }

    container(sections.padding(15))
        .width(Length::Fixed(250.0))
        .height(Length::Fill)
        .into()
}
