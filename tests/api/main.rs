mod health;
mod helpers;
mod room;
