pub mod grant_events;
