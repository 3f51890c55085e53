// Domain layer: timetable models and ports (interfaces) toward the server.

pub mod assignment_key;
pub mod calendar;
pub mod model;
pub mod ports;
pub mod schedule;
