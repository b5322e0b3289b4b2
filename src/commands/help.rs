pub(super) const HELP: &str = "*🤖 Available commands:*

• *!slap @user* - Slap someone with a GIF
• *!kick @user* - Kick someone with a GIF
• *!flyingkick @user* - Flying kick someone with a GIF
• *!kiss @user* - Kiss someone with a GIF
• *!hug @user* - Hug someone with a GIF
• *!joke* - An AI-generated joke, never a repeat
• *!pickup @user* - An AI-generated pickup line for someone
• *!story [genre]* - An AI-generated story (e.g. !story horror, !story comedy)
• *!explain* - Explain a message (reply to it and type !explain)
• *!selfdestruct [minutes]* - Pause the bot with a countdown (default 5, max 60)
• *!roulette* - Pair up two random group members
• *!help* - Show this list

_Portuguese aliases also work:_ !tapa, !chute, !voadora, !beijo, !abraco, !piada, !cantada, !historia, !explique, !autodestruicao, !roletacasais, !ajuda

_Examples:_
• !slap @friend
• !hug @friend
• !joke
• !pickup @friend
• !story horror
• Reply to a message and type: !explain
• !selfdestruct 10 (pause for 10 minutes)
• !roulette
• !help";
