pub use self::display::Display;

mod display;
