//! The observed object: a crystal ball that can be moved, admired, polished,
//! shattered and fixed.

use scry::{Target, Value};
use scry_core::MethodError;
use scry_core::value::{arg_i64, arg_str, opt_str};

use crate::narrator::Narrator;

/// Methods made observable; `admire` is deliberately left out.
pub const WATCHED: [&str; 4] = ["move", "polish", "shatter", "fix"];

const NARRATOR: &str = "Narrator";

#[derive(Debug, Clone)]
pub struct CrystalBall {
    position: (i64, i64),
    polished: bool,
    broken: bool,
    narrator: Narrator,
}

impl CrystalBall {
    pub fn new(x: i64, y: i64, narrator: Narrator) -> Self {
        Self {
            position: (x, y),
            polished: false,
            broken: false,
            narrator,
        }
    }

    pub fn position(&self) -> (i64, i64) {
        self.position
    }

    pub fn is_polished(&self) -> bool {
        self.polished
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn move_to(&mut self, args: &[Value]) -> Result<Value, MethodError> {
        let (x, y) = (arg_i64(args, 0)?, arg_i64(args, 1)?);
        if self.broken {
            self.narrator
                .say(NARRATOR, "The crystal ball is broken - it can't be moved!");
        } else {
            self.position = (x, y);
            self.polished = false;
            self.narrator.say(
                NARRATOR,
                format!(
                    "The crystal ball has been moved to ({x}, {y}). Also, dirty hands have left its gleaming surface unpolished!"
                ),
            );
        }
        Ok(Value::Null)
    }

    fn admire(&mut self, args: &[Value]) -> Result<Value, MethodError> {
        let who = opt_str(args, 0).unwrap_or("Someone");
        let line = if self.broken {
            format!("{who} has a hard time admiring a broken crystal ball!")
        } else if !self.polished {
            format!("{who} thinks that this crystal ball might be pretty, if it wasn't so unpolished.")
        } else {
            format!("{who} admires a beautifully polished crystal ball!")
        };
        self.narrator.say(NARRATOR, line);
        Ok(Value::Null)
    }

    fn polish(&mut self, _: &[Value]) -> Result<Value, MethodError> {
        if self.broken {
            self.narrator
                .say(NARRATOR, "The crystal ball is broken - it can't be polished!");
        } else {
            self.polished = true;
            self.narrator
                .say(NARRATOR, "The crystal ball is now nicely polished.");
        }
        Ok(Value::Null)
    }

    fn shatter(&mut self, args: &[Value]) -> Result<Value, MethodError> {
        let device = arg_str(args, 0)?;
        if self.broken {
            self.narrator.say(
                NARRATOR,
                format!(
                    "The crystal ball is already broken, and it can't be shattered even more. Not even with a {device}."
                ),
            );
        } else {
            self.broken = true;
            self.narrator.say(
                NARRATOR,
                format!("The crystal ball was shattered with a {device}! What a sad day."),
            );
        }
        Ok(Value::Null)
    }

    fn fix(&mut self, _: &[Value]) -> Result<Value, MethodError> {
        if self.broken {
            self.narrator
                .say(NARRATOR, "As if by magic, the crystal ball is fixed!");
            self.broken = false;
        } else {
            self.narrator.say(NARRATOR, "If it ain't broke, don't fix it.");
        }
        Ok(Value::Null)
    }
}

/// Build the ball as a target (not yet observable).
pub fn crystal_ball(x: i64, y: i64, narrator: Narrator) -> Target<CrystalBall> {
    Target::builder(CrystalBall::new(x, y, narrator))
        .method("move", CrystalBall::move_to)
        .method("admire", CrystalBall::admire)
        .method("polish", CrystalBall::polish)
        .method("shatter", CrystalBall::shatter)
        .method("fix", CrystalBall::fix)
        .build()
}
