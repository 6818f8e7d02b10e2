//! Numbered menus over any line reader and writer

use std::io::{self, BufRead, Write};

/// What the user picked from a menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Index into the listed entries
    Item(usize),
    /// The "check for more" entry
    More,
    /// The trailing quit / return entry
    Back,
}

/// A menu to render: entries numbered from 0, then the optional "more"
/// entry, then the back entry
#[derive(Debug, Clone)]
pub struct Menu<'a> {
    pub heading: Option<String>,
    pub entries: Vec<String>,
    pub more: Option<&'a str>,
    pub back: &'a str,
    pub prompt: &'a str,
}

impl<'a> Menu<'a> {
    pub fn new(entries: Vec<String>, back: &'a str, prompt: &'a str) -> Self {
        Self {
            heading: None,
            entries,
            more: None,
            back,
            prompt,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    /// Offer a "more" entry when `more` is set
    pub fn with_more(mut self, more: Option<&'a str>) -> Self {
        self.more = more;
        self
    }

    /// Map a typed number onto an entry
    fn resolve(&self, number: usize) -> Option<Choice> {
        let listed = self.entries.len();
        let more_index = self.more.map(|_| listed);
        let back_index = listed + usize::from(self.more.is_some());

        if number < listed {
            Some(Choice::Item(number))
        } else if Some(number) == more_index {
            Some(Choice::More)
        } else if number == back_index {
            Some(Choice::Back)
        } else {
            None
        }
    }
}

pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Show `menu` until a valid number is entered
    ///
    /// End of input counts as picking the back entry.
    pub fn choose(
        &mut self,
        menu: &Menu<'_>,
        index: impl Fn(usize) -> String,
    ) -> io::Result<Choice> {
        loop {
            if let Some(heading) = &menu.heading {
                writeln!(self.output, "{heading}")?;
            }
            for (i, entry) in menu.entries.iter().enumerate() {
                writeln!(self.output, "\t{} {entry}", index(i))?;
            }
            let mut next = menu.entries.len();
            if let Some(more) = menu.more {
                writeln!(self.output, "\t{} {more}", index(next))?;
                next += 1;
            }
            writeln!(self.output, "\t{} {}", index(next), menu.back)?;

            let Some(answer) = self.ask(menu.prompt)? else {
                return Ok(Choice::Back);
            };
            match answer.parse::<usize>().ok().and_then(|n| menu.resolve(n)) {
                Some(choice) => return Ok(choice),
                None => writeln!(self.output, "Invalid selection.")?,
            }
        }
    }

    /// Ask a yes/no question until answered; end of input means no
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(false);
            };
            match answer.as_str() {
                "y" | "Y" => return Ok(true),
                "n" | "N" => return Ok(false),
                _ => writeln!(self.output, "Invalid input. Please try again")?,
            }
        }
    }

    /// Wait for a line (or end of input)
    pub fn pause(&mut self, message: &str) -> io::Result<()> {
        self.ask(message).map(|_| ())
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn plain_index(i: usize) -> String {
        format!("{i})")
    }

    fn prompt(input: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
        Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(prompt: Prompt<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompt.into_output()).unwrap()
    }

    #[test]
    fn test_menu_numbering() {
        let menu = Menu::new(vec!["a".into(), "b".into()], "quit", "Pick: ")
            .with_more(Some("more"));
        assert_eq!(menu.resolve(0), Some(Choice::Item(0)));
        assert_eq!(menu.resolve(1), Some(Choice::Item(1)));
        assert_eq!(menu.resolve(2), Some(Choice::More));
        assert_eq!(menu.resolve(3), Some(Choice::Back));
        assert_eq!(menu.resolve(4), None);

        let plain = Menu::new(vec!["a".into()], "quit", "Pick: ");
        assert_eq!(plain.resolve(1), Some(Choice::Back));
        assert_eq!(plain.resolve(2), None);
    }

    #[test]
    fn test_choose_renders_and_reprompts() {
        let mut p = prompt("x\n7\n1\n");
        let menu = Menu::new(vec!["DFW".into()], "quit", "Please select data center: ")
            .with_heading("Found Cloud Files Data Centers:");

        let choice = p.choose(&menu, plain_index).unwrap();
        assert_eq!(choice, Choice::Back);

        let out = output(p);
        assert!(out.contains("\t0) DFW\n"));
        assert!(out.contains("\t1) quit\n"));
        assert_eq!(out.matches("Invalid selection.").count(), 2);
        assert_eq!(out.matches("Found Cloud Files Data Centers:").count(), 3);
    }

    #[test]
    fn test_choose_end_of_input_is_back() {
        let mut p = prompt("");
        let menu = Menu::new(vec!["a".into()], "back", "> ");
        assert_eq!(p.choose(&menu, plain_index).unwrap(), Choice::Back);
    }

    #[test]
    fn test_confirm() {
        let mut p = prompt("maybe\nY\n");
        assert!(p.confirm("Download? [y/n]").unwrap());
        assert!(output(p).contains("Invalid input. Please try again"));

        let mut p = prompt("n\n");
        assert!(!p.confirm("Download? [y/n]").unwrap());

        let mut p = prompt("");
        assert!(!p.confirm("Download? [y/n]").unwrap());
    }
}
