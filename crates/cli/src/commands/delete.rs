//! `delete` command

use std::io::{self, BufRead, Write};

use clap::Args;

use livetable::products::{ProductsService, data::DeleteRequest, models::ProductId};

use super::CommandError;

const CONFIRMATION_PROMPT: &str = "Are you sure you want to delete this product?";

/// Arguments for `delete`.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Product id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

pub(crate) async fn run(
    service: &dyn ProductsService,
    args: DeleteArgs,
    input: impl BufRead,
) -> Result<(), CommandError> {
    let request = DeleteRequest::new(ProductId::new(args.id));

    let mut out = io::stdout();

    if !args.yes && !confirm(&mut out, input)? {
        writeln!(out, "delete cancelled")?;

        return Ok(());
    }

    let deleted = service.delete_product(request.confirm()).await?;

    writeln!(out, "deleted product {deleted}")?;

    Ok(())
}

fn confirm(out: &mut impl Write, mut input: impl BufRead) -> io::Result<bool> {
    write!(out, "{CONFIRMATION_PROMPT} [y/N] ")?;

    out.flush()?;

    let mut answer = String::new();

    input.read_line(&mut answer)?;

    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        for answer in ["y\n", "YES\n", " yes "] {
            assert!(is_yes(answer), "{answer:?} should confirm");
        }

        for answer in ["", "\n", "n\n", "no", "sure"] {
            assert!(!is_yes(answer), "{answer:?} should not confirm");
        }
    }

    #[test]
    fn prompt_is_written_before_reading() -> TestResult {
        let mut out = Vec::new();

        let confirmed = confirm(&mut out, "y\n".as_bytes())?;

        assert!(confirmed);
        assert_eq!(
            String::from_utf8(out)?,
            "Are you sure you want to delete this product? [y/N] "
        );

        Ok(())
    }
}
