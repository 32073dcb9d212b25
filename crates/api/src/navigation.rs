// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Redirect-based navigation between the applicant pages.

/// A page a handler can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The application status page (`/status/`).
    Status,
    /// The page shown once an account is approved (`/congratulations/`).
    Congratulations,
    /// The informational page for reviewers without an account.
    AdminWithoutAccount,
}

impl Destination {
    /// Returns the URL path for this destination.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Status => "/status/",
            Self::Congratulations => "/congratulations/",
            Self::AdminWithoutAccount => "/admin-without-account/",
        }
    }
}

/// The outcome of a page handler: render a view or go somewhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation<T> {
    /// Render the view.
    Render(T),
    /// Redirect, optionally carrying a flash message.
    Redirect {
        /// Where to send the user.
        to: Destination,
        /// A message to show on the next page.
        message: Option<String>,
    },
}

impl<T> Navigation<T> {
    /// A redirect with no message.
    #[must_use]
    pub const fn redirect(to: Destination) -> Self {
        Self::Redirect { to, message: None }
    }

    /// A redirect carrying a flash message.
    #[must_use]
    pub fn redirect_with_message(to: Destination, message: &str) -> Self {
        Self::Redirect {
            to,
            message: Some(message.to_string()),
        }
    }

    /// Returns the redirect target, if this is a redirect.
    #[must_use]
    pub const fn destination(&self) -> Option<Destination> {
        match self {
            Self::Render(_) => None,
            Self::Redirect { to, .. } => Some(*to),
        }
    }
}
