pub mod like_toggle;

pub mod navigation;

pub mod notification;
