pub mod academic;
pub mod backup;
pub mod classes;
pub mod core;
pub mod daily;
pub mod events;
pub mod timetable;
pub mod users;
