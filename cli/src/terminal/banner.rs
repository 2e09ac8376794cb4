use colored::*;

use crate::terminal::print;

const BANNER: &str = r#"
               __      ___
   ____  ___  / /_____/ (_)___ _____ _
  / __ \/ _ \/ __/ __  / / __ `/ __ `/
 / / / /  __/ /_/ /_/ / / /_/ / /_/ /
/_/ /_/\___/\__/\__,_/_/\__,_/\__, /
                             /____/
"#;

pub fn print() {
    let lines: Vec<&str> = BANNER.lines().filter(|line| !line.trim().is_empty()).collect();
    let width: usize = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    let pad: String = " ".repeat(print::TOTAL_WIDTH.saturating_sub(width) / 2);

    for line in lines {
        print::print(&format!("{}{}", pad, line.bright_green()));
    }
}
