use welt_lang::repl::StdioHost;
use welt_lang::runner::run;

use std::env::args;

use futures::executor::block_on;

fn main() {
    let limit = args().nth(1).unwrap_or_else(|| "15".to_string());

    let fizzbuzz = format!(
        "ERWACHE\n\
         DING 0 = 1\n\
         SOLANGE DING 0 <= {}\n\
             DING 1 = DING 0 MOD 15\n\
             DING 2 = DING 0 MOD 3\n\
             DING 3 = DING 0 MOD 5\n\
             WENN DING 1 = 0 DANN\n\
                 VORSTELLUNG \"FizzBuzz\"\n\
             SONST\n\
                 WENN DING 2 = 0 DANN\n\
                     VORSTELLUNG \"Fizz\"\n\
                 SONST\n\
                     WENN DING 3 = 0 DANN\n\
                         VORSTELLUNG \"Buzz\"\n\
                     SONST\n\
                         VORSTELLUNG DING 0\n\
                     ENDE\n\
                 ENDE\n\
             ENDE\n\
             DING 0 = DING 0 + 1\n\
         ENDE\n\
         VERNEINUNG",
        limit
    );

    block_on(run(&fizzbuzz, &mut StdioHost)).unwrap();
}
