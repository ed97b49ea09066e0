//! Plain-text building blocks shared by the pages.

pub mod habit_card;
pub mod habit_form;
pub mod navigation;
pub mod widgets;
