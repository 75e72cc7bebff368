/*!

This is the long-form manual for `party_tally` and `etally`.

## Input format

The inputs are the "votação por partido e município/zona" result files, one
directory per election. Every `.csv` file in the directory is read. The files are
expected to use `;` as the delimiter and to be encoded in latin-1:

```text
ANO_ELEICAO;SG_UF;NM_MUNICIPIO;SG_PARTIDO;NM_COLIGACAO;QT_VOTOS_NOMINAIS_VALIDOS
2022;SP;CAMPINAS;PT;BRASIL DA ESPERANÇA;1.234
2022;SP;CAMPINAS;PL;PELO BEM DO BRASIL;987
```

The files do not need to have exactly the same columns. The columns are found
by name, using the header of the first file (in alphabetical order):

| role      | keywords, by priority                                                  |
|-----------|------------------------------------------------------------------------|
| party     | `SG_PARTIDO`, `PARTIDO`, `SIGLA`                                       |
| votes     | `QT_VOTOS_NOMINAIS_VALIDOS`, `QT_VOTOS`, `VOTOS_NOMINAIS`, `VOTOS`     |
| coalition | `NM_COLIGACAO`, `COLIGACAO`, `NM_COLIGA`                               |

A header matches a keyword if it contains it, ignoring case. The first keyword
that matches any header wins, even if another header comes first in the file.
With the `legend` metric, `QT_TOTAL_VOTOS_LEG_VALIDOS` is tried before the
keywords above.

If the party or the votes column cannot be found, the run stops and reports
the keywords together with the headers that were found.

Vote cells are integers written with thousands separators. Both `.` and `,`
are removed before reading the number, so `1.234` is `1234` and `1.234,56` is
`123456`. A cell that is not a number after that counts as zero votes.

A file that cannot be read with `;` and latin-1 is read again as a plain
comma-separated UTF-8 file. If that fails too, the file is skipped with a
warning and the other files are still counted.

## Configuration

`etally` uses the default keywords and the directories
`votacao_partido_munzona_2018` and `votacao_partido_munzona_2022` if no
configuration is given. All the values can be set in a JSON file passed with
`--config`:

```json
{
  "outputSettings": {
    "outputDirectory": "charts",
    "maxItems": 120,
    "renderCharts": true,
    "othersLabel": "OUTROS"
  },
  "sources": [
    {"label": "2018", "directory": "votacao_partido_munzona_2018"},
    {"label": "2022", "directory": "votacao_partido_munzona_2022", "trackCoalitions": true}
  ],
  "columns": {
    "partyKeywords": ["SG_PARTIDO", "PARTIDO", "SIGLA"]
  },
  "metric": "nominal"
}
```

Every field is optional. Exactly two sources must be given: the first one is
the reference election for the percentage variation. Relative directories are
relative to the configuration file.

The command line flags `--before`, `--after`, `--charts-dir`, `--max-items` and
`--metric` take precedence over the configuration file.

## Outputs

- the number of parties (and coalitions) found for each election
- the mean, median and standard deviation of the votes per party, and of the
  variation between the two elections
- the charts `votos_<label>.svg`, `votos_colig_<label>.svg`,
  `variacao_percentual.svg` and `dispersao.svg`
- with `--out`, a JSON summary of all the numbers above (`--out stdout` prints it)

`--no-charts` disables the charts. `--reference summary.json` compares the
computed summary with a stored one, prints the differences and fails if there
are any.

 */
