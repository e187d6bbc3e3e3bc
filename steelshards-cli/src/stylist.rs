use console::{style, StyledObject};

pub fn error<T>(msg: T) -> StyledObject<T> {
    style(msg).red().bold()
}

pub fn warning<T>(msg: T) -> StyledObject<T> {
    style(msg).yellow().bold()
}

pub fn info<T>(msg: T) -> StyledObject<T> {
    style(msg).cyan().dim()
}

pub fn line_number<T>(num: T) -> StyledObject<T> {
    style(num).blue().dim()
}
