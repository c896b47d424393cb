//! /help command.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};

use crate::bot::dispatcher::ThrottledBot;

pub const HELP_TEXT: &str = "\
<b>Antiflood</b>

Take action on users who send too many messages in a row. \
Another member speaking in between resets the run.

/flood - show the current flood control setting

<b>Admins only:</b>
/setflood &lt;n|off|no|0&gt; - act after n consecutive messages (3 or more), or disable
/setfloodmode &lt;ban|kick|mute|tban|tmute&gt; [duration] - what happens to flooders

tban and tmute need a duration:
4m = 4 minutes
3h = 3 hours
6d = 6 days
5w = 5 weeks";

pub async fn help_command(bot: ThrottledBot, msg: Message) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, HELP_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}
