mod driver;
mod session;
